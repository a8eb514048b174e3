//! # Draw Lists
//!
//! Per-screen lists of the entities to draw this frame, ordered by draw
//! layer. Entities within a layer keep slot order.

use super::entity::{SlotId, ENTITY_COUNT};
use super::world::World;
use crate::memory::EntityPool;

/// Number of draw layers, one per `draw_order` value.
pub const DRAW_ORDER_COUNT: usize = u8::MAX as usize + 1;

/// One entry of a screen's draw list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawEntry {
    /// The entity to draw.
    pub slot: SlotId,
    /// Its draw layer when the list was built.
    pub draw_order: u8,
}

/// The draw lists of every screen.
pub struct DrawList {
    screens: Vec<Vec<DrawEntry>>,
}

impl DrawList {
    /// Creates empty lists for `screen_count` screens.
    #[must_use]
    pub fn new(screen_count: usize) -> Self {
        Self {
            screens: (0..screen_count)
                .map(|_| Vec::with_capacity(ENTITY_COUNT))
                .collect(),
        }
    }

    /// Returns the number of screens.
    #[inline]
    #[must_use]
    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    /// Returns a screen's entries in draw order. Unknown screens are empty.
    #[inline]
    #[must_use]
    pub fn screen(&self, screen: usize) -> &[DrawEntry] {
        self.screens.get(screen).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates over the slots drawn on `screen` in layer `draw_order`.
    ///
    /// Layers run from 0 (drawn first) to `DRAW_ORDER_COUNT - 1`.
    pub fn layer(&self, screen: usize, draw_order: u8) -> impl Iterator<Item = SlotId> + '_ {
        self.screen(screen)
            .iter()
            .filter(move |entry| entry.draw_order == draw_order)
            .map(|entry| entry.slot)
    }

    /// Empties every screen.
    pub fn clear(&mut self) {
        for entries in &mut self.screens {
            entries.clear();
        }
    }

    /// Rebuilds every screen from the slot table.
    ///
    /// An entity is listed on a screen when it is in range, visible and has
    /// that screen's bit set in its screen mask.
    pub fn rebuild(&mut self, pool: &EntityPool) {
        for (screen, entries) in self.screens.iter_mut().enumerate() {
            let mask = 1u8 << screen;
            entries.clear();
            entries.extend(
                pool.iter()
                    .filter(|(_, entity)| {
                        !entity.class_id().is_default()
                            && entity.in_range
                            && entity.visible
                            && entity.active_screens & mask != 0
                    })
                    .map(|(slot, entity)| DrawEntry {
                        slot,
                        draw_order: entity.draw_order,
                    }),
            );
            // Stable, so slot order holds within a layer.
            entries.sort_by_key(|entry| entry.draw_order);
        }
    }
}

impl World {
    /// Returns the draw lists built by the last [`World::process_draw_lists`].
    #[inline]
    #[must_use]
    pub const fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    /// Returns the screen currently being drawn.
    #[inline]
    #[must_use]
    pub const fn current_screen(&self) -> usize {
        self.current_screen
    }

    /// Builds the draw lists and runs every listed entity's draw callback,
    /// screen by screen.
    ///
    /// Entities retired or hidden by an earlier draw callback are skipped.
    pub fn process_draw_lists(&mut self) {
        self.draw_list.rebuild(&self.pool);

        for screen in 0..self.draw_list.screen_count() {
            self.current_screen = screen;
            let mut position = 0;
            while let Some(entry) = self.draw_list.screen(screen).get(position).copied() {
                position += 1;
                let entity = self.pool.entity(entry.slot);
                if entity.class_id().is_default() || !entity.visible {
                    continue;
                }
                if let Some(draw) = self.registry.draw_callback(entity.class_id()) {
                    draw(self, entry.slot);
                }
            }
        }
        self.current_screen = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::ActiveFlag;
    use crate::object::ClassId;

    fn drawable(pool: &mut EntityPool, index: usize, draw_order: u8, screens: u8) -> SlotId {
        let slot = SlotId::clamped(index);
        pool.reset(slot, ClassId::new(1));
        let entity = pool.entity_mut(slot);
        entity.in_range = true;
        entity.visible = true;
        entity.active = ActiveFlag::Normal;
        entity.draw_order = draw_order;
        entity.active_screens = screens;
        slot
    }

    #[test]
    fn test_sorted_by_layer_then_slot() {
        let mut pool = EntityPool::new();
        let a = drawable(&mut pool, 10, 3, 0b1);
        let b = drawable(&mut pool, 20, 1, 0b1);
        let c = drawable(&mut pool, 30, 3, 0b1);
        let d = drawable(&mut pool, 40, 1, 0b1);

        let mut list = DrawList::new(1);
        list.rebuild(&pool);

        let order: Vec<_> = list.screen(0).iter().map(|e| e.slot).collect();
        assert_eq!(order, vec![b, d, a, c]);
        assert_eq!(list.layer(0, 3).collect::<Vec<_>>(), vec![a, c]);
    }

    #[test]
    fn test_screen_mask() {
        let mut pool = EntityPool::new();
        let both = drawable(&mut pool, 10, 0, 0b11);
        let second = drawable(&mut pool, 11, 0, 0b10);

        let mut list = DrawList::new(2);
        list.rebuild(&pool);

        assert_eq!(list.layer(0, 0).collect::<Vec<_>>(), vec![both]);
        assert_eq!(list.layer(1, 0).collect::<Vec<_>>(), vec![both, second]);
        assert!(list.screen(2).is_empty());
    }

    #[test]
    fn test_hidden_and_out_of_range_skipped() {
        let mut pool = EntityPool::new();
        let hidden = drawable(&mut pool, 10, 0, 0b1);
        pool.entity_mut(hidden).visible = false;
        let far = drawable(&mut pool, 11, 0, 0b1);
        pool.entity_mut(far).in_range = false;

        let mut list = DrawList::new(1);
        list.rebuild(&pool);
        assert!(list.screen(0).is_empty());

        list.clear();
        assert_eq!(list.screen_count(), 1);
    }
}
