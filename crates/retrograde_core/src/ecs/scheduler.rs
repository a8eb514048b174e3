//! # Update Scheduler
//!
//! Decides which entities run each frame and runs them.
//!
//! A pass runs in four phases:
//!
//! ```text
//! static updates -> entity updates -> group rebuild -> late updates
//! ```
//!
//! Three pass types exist. A normal pass runs [`ActiveFlag::Always`],
//! [`ActiveFlag::Normal`] and the bounds flags that pass their camera test. A
//! paused pass runs `Always` and [`ActiveFlag::Paused`]. A frozen pass runs
//! only `Always`.

use super::camera::Camera;
use super::entity::{ActiveFlag, Entity, SlotId, ENTITY_COUNT};
use super::world::World;
use crate::math::{Vector2, FIXED_SHIFT};
use crate::object::ClassId;
use tracing::trace;

/// Which kind of pass is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdatePass {
    /// Regular gameplay.
    Normal,
    /// The game is paused.
    Paused,
    /// The game is frozen (e.g. hit-stop); only `Always` entities run.
    Frozen,
}

impl UpdatePass {
    /// Selects the pass for the current pause state. Frozen wins over paused.
    #[inline]
    #[must_use]
    pub const fn select(paused: bool, frozen: bool) -> Self {
        if frozen {
            Self::Frozen
        } else if paused {
            Self::Paused
        } else {
            Self::Normal
        }
    }
}

/// Whether an entity with `flag` runs its update in `pass`.
///
/// `in_bounds` is the result of the flag's camera test and only matters for
/// the bounds flags.
#[inline]
#[must_use]
pub const fn runs_update(flag: ActiveFlag, pass: UpdatePass, in_bounds: bool) -> bool {
    match (pass, flag) {
        (_, ActiveFlag::Always)
        | (UpdatePass::Normal, ActiveFlag::Normal)
        | (UpdatePass::Paused, ActiveFlag::Paused) => true,
        (
            UpdatePass::Normal,
            ActiveFlag::Bounds | ActiveFlag::XBounds | ActiveFlag::YBounds | ActiveFlag::RBounds,
        ) => in_bounds,
        _ => false,
    }
}

/// Whether an entity counts as in range after `pass`.
///
/// Entities that run in the pass are in range. Entities that would run in a
/// normal pass also stay in range while paused or frozen, so pausing does not
/// empty the group and draw lists.
#[inline]
#[must_use]
pub const fn in_range(flag: ActiveFlag, pass: UpdatePass, in_bounds: bool) -> bool {
    runs_update(flag, pass, in_bounds) || runs_update(flag, UpdatePass::Normal, in_bounds)
}

/// Tests a position against one camera for a bounds flag.
///
/// Each axis passes when `|position - camera| <= range + camera offset`. The
/// radial test compares squared whole-pixel distance against the squared
/// whole-pixel horizontal range. Non-bounds flags never pass.
#[must_use]
pub fn bounds_test(flag: ActiveFlag, position: Vector2, range: Vector2, camera: &Camera) -> bool {
    let dx = (i64::from(position.x) - i64::from(camera.position.x)).abs();
    let dy = (i64::from(position.y) - i64::from(camera.position.y)).abs();
    let rx = i64::from(range.x) + i64::from(camera.offset.x);
    let ry = i64::from(range.y) + i64::from(camera.offset.y);

    match flag {
        ActiveFlag::Bounds => dx <= rx && dy <= ry,
        ActiveFlag::XBounds => dx <= rx,
        ActiveFlag::YBounds => dy <= ry,
        ActiveFlag::RBounds => {
            let px = dx >> FIXED_SHIFT;
            let py = dy >> FIXED_SHIFT;
            let radius = rx >> FIXED_SHIFT;
            px * px + py * py <= radius * radius
        }
        _ => false,
    }
}

impl World {
    /// Runs a normal pass.
    pub fn process_objects(&mut self) {
        self.run_pass(UpdatePass::Normal);
    }

    /// Runs a paused pass.
    pub fn process_paused_objects(&mut self) {
        self.run_pass(UpdatePass::Paused);
    }

    /// Runs a frozen pass.
    pub fn process_frozen_objects(&mut self) {
        self.run_pass(UpdatePass::Frozen);
    }

    /// Runs one frame: the pass selected by the pause state, then drawing.
    pub fn step(&mut self) {
        self.run_pass(UpdatePass::select(self.paused, self.frozen));
        self.process_draw_lists();
    }

    /// Whether a position is within `range` of any camera on both axes.
    ///
    /// The bounds are inclusive.
    #[must_use]
    pub fn check_pos_on_screen(&self, position: Vector2, range: Vector2) -> bool {
        self.cameras
            .iter()
            .any(|camera| bounds_test(ActiveFlag::Bounds, position, range, camera))
    }

    /// Whether an entity is within range of any camera on both axes.
    ///
    /// Uses the entity's own update range unless `range` is given.
    #[must_use]
    pub fn check_on_screen(&self, slot: SlotId, range: Option<Vector2>) -> bool {
        let entity = self.pool.entity(slot);
        self.check_pos_on_screen(entity.position, range.unwrap_or(entity.update_range))
    }

    fn in_bounds(&self, entity: &Entity) -> bool {
        self.cameras
            .iter()
            .any(|camera| bounds_test(entity.active, entity.position, entity.update_range, camera))
    }

    fn run_pass(&mut self, pass: UpdatePass) {
        let baseline = self.foreach.depth();

        self.run_static_updates(pass);
        self.run_entity_updates(pass);
        self.type_groups.rebuild(self.pool.iter_live());
        self.run_late_updates();

        let leaked = self.foreach.depth().saturating_sub(baseline);
        if leaked > 0 {
            self.foreach_misuse(&format!(
                "{leaked} foreach loops left open at the end of a {pass:?} pass"
            ));
            self.foreach.truncate(baseline);
        }

        self.frame = self.frame.wrapping_add(1);
        trace!("Completed {:?} pass {}", pass, self.frame);
    }

    fn run_static_updates(&mut self, pass: UpdatePass) {
        let mut index = 0;
        while index < self.registry.len() {
            #[allow(clippy::cast_possible_truncation)]
            let class_id = ClassId::new(index as u16);
            if runs_update(self.registry.class(class_id).active(), pass, false) {
                if let Some(static_update) = self.registry.static_update_callback(class_id) {
                    static_update(self);
                }
            }
            index += 1;
        }
    }

    fn run_entity_updates(&mut self, pass: UpdatePass) {
        for index in 0..ENTITY_COUNT {
            let slot = SlotId::clamped(index);
            let entity = self.pool.entity(slot);
            let class_id = entity.class_id;

            if class_id.is_default() {
                self.pool.entity_mut(slot).in_range = false;
                self.updated[index] = false;
                continue;
            }

            let flag = entity.active;
            let in_bounds = flag.is_bounds() && self.in_bounds(entity);
            let runs = runs_update(flag, pass, in_bounds);
            self.pool.entity_mut(slot).in_range = in_range(flag, pass, in_bounds);
            self.updated[index] = runs;

            if runs {
                if let Some(update) = self.registry.update_callback(class_id) {
                    update(self, slot);
                }
            }
        }
    }

    fn run_late_updates(&mut self) {
        for index in 0..ENTITY_COUNT {
            if !self.updated[index] {
                continue;
            }
            let slot = SlotId::clamped(index);
            let class_id = self.pool.entity(slot).class_id;
            if let Some(late_update) = self.registry.late_update_callback(class_id) {
                late_update(self, slot);
            }
        }
    }
}
