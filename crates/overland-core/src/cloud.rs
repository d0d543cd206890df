//! Cloud-advection moisture: the agent-based alternative to the noise
//! moisture field.
//!
//! Clouds enter on the upwind grid edge, travel one cell per step along a
//! fixed compass heading, hold their moisture over ocean, and rain it out
//! over land in proportion to the height ratio of the step. A terrace
//! obstacle splits a cloud once into two siblings at ±1 compass step.
use std::collections::VecDeque;

use crate::terrace::WATER_LEVEL;
use crate::world::{Compass, World};

/// Moisture deposited per land step before the height-ratio multiplier.
pub const RAIN: f64 = 0.5;

/// Clouds do not rain below this height.
pub const RAIN_LEVEL: f64 = WATER_LEVEL;

pub struct Cloud {
    moisture: f64,
    direction: Compass,
    pos: usize,
    split: bool,
}

impl Cloud {
    pub fn new(moisture: f64, direction: Compass, pos: usize) -> Self {
        Self {
            moisture,
            direction,
            pos,
            split: false,
        }
    }

    /// Advance one step. Returns `true` when the cloud has terminated and
    /// must be removed from the queue.
    ///
    /// Children produced by a terrace split are pushed onto `spawned`.
    pub fn update(&mut self, world: &mut World, spawned: &mut Vec<Cloud>) -> bool {
        if self.moisture <= 0.0 {
            return true;
        }
        let Some(next) = world.step(self.pos, self.direction) else {
            // Stepped off the grid edge.
            return true;
        };

        let next_height = world.cells()[next].height;
        if next_height < RAIN_LEVEL {
            // Hold moisture while traversing ocean.
            self.pos = next;
            return false;
        }

        let cur_height = world.cells()[self.pos].height;
        let mut multiplier = if cur_height.abs() > f64::EPSILON {
            (next_height / cur_height).abs()
        } else {
            1.0
        };

        if !self.split && world.cells()[next].terrace > world.cells()[self.pos].terrace {
            // One-time split at a terrace obstacle: siblings head one compass
            // step to either side, each carrying a third of the moisture; the
            // parent's rain doubles to compensate for the lost mass.
            self.split = true;
            self.moisture /= 3.0;
            spawned.push(Cloud {
                moisture: self.moisture,
                direction: self.direction.rotate_cw(),
                pos: self.pos,
                split: true,
            });
            spawned.push(Cloud {
                moisture: self.moisture,
                direction: self.direction.rotate_ccw(),
                pos: self.pos,
                split: true,
            });
            multiplier *= 2.0;
        }

        let total = RAIN * multiplier;
        let cell = &mut world.cells_mut()[next];
        if self.moisture < total {
            cell.moisture += self.moisture;
            self.moisture = 0.0;
        } else {
            cell.moisture += total;
            self.moisture -= total;
        }
        self.pos = next;
        false
    }
}

/// Run the advection model to completion, replacing the grid's moisture
/// field. Clouds spawn along the edge(s) behind the wind direction and the
/// queue drains until every cloud has terminated.
pub fn advect_moisture(world: &mut World, wind: Compass, initial: f64) {
    let mut queue: VecDeque<Cloud> = spawn_clouds(world, wind, initial).into();
    let mut spawned = Vec::new();
    while let Some(mut cloud) = queue.pop_front() {
        let done = cloud.update(world, &mut spawned);
        if !done {
            queue.push_back(cloud);
        }
        queue.extend(spawned.drain(..));
    }
}

fn spawn_clouds(world: &World, wind: Compass, initial: f64) -> Vec<Cloud> {
    let (dx, dy) = wind.offset();
    let width = world.width();
    let height = world.height();
    let mut entries: Vec<usize> = Vec::new();

    if dx > 0 {
        entries.extend((0..height).map(|y| y * width));
    } else if dx < 0 {
        entries.extend((0..height).map(|y| y * width + width - 1));
    }
    if dy > 0 {
        entries.extend(0..width);
    } else if dy < 0 {
        entries.extend((0..width).map(|x| (height - 1) * width + x));
    }
    entries.sort_unstable();
    entries.dedup();

    entries
        .into_iter()
        .map(|pos| Cloud::new(initial, wind, pos))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrace::terrace_for;
    use approx::assert_relative_eq;

    fn flat_land(width: usize, height: usize, h: f64) -> World {
        let mut world = World::new(width, height);
        for cell in world.cells_mut() {
            cell.height = h;
            cell.terrace = terrace_for(h);
        }
        world
    }

    #[test]
    fn dry_cloud_terminates_immediately() {
        let mut world = flat_land(4, 1, 0.2);
        let mut spawned = Vec::new();
        let mut cloud = Cloud::new(0.0, Compass::East, 0);
        assert!(cloud.update(&mut world, &mut spawned));
        assert!(spawned.is_empty());
    }

    #[test]
    fn cloud_exits_at_grid_edge() {
        let mut world = flat_land(3, 1, 0.2);
        let mut spawned = Vec::new();
        let mut cloud = Cloud::new(5.0, Compass::East, 0);
        assert!(!cloud.update(&mut world, &mut spawned));
        assert!(!cloud.update(&mut world, &mut spawned));
        assert!(cloud.update(&mut world, &mut spawned), "stepping past x=2 must terminate");
    }

    #[test]
    fn ocean_traversal_holds_moisture() {
        let mut world = flat_land(5, 1, 0.2);
        for x in 0..3 {
            world.cell_mut(x, 0).height = -0.8;
            world.cell_mut(x, 0).terrace = terrace_for(-0.8);
        }
        let mut spawned = Vec::new();
        let mut cloud = Cloud::new(2.0, Compass::East, 0);
        // Two ocean steps: nothing deposited.
        cloud.update(&mut world, &mut spawned);
        cloud.update(&mut world, &mut spawned);
        assert_relative_eq!(world.moisture_at(1, 0), 0.0);
        assert_relative_eq!(world.moisture_at(2, 0), 0.0);
        // Landfall: flat height ratio of 1 deposits exactly RAIN.
        cloud.update(&mut world, &mut spawned);
        assert_relative_eq!(world.moisture_at(3, 0), RAIN);
    }

    #[test]
    fn terrace_obstacle_splits_once() {
        // Lowlands, then a midlands step at x=2, then highlands at x=3.
        let mut world = flat_land(5, 3, -0.1);
        for y in 0..3 {
            world.cell_mut(2, y).height = 0.2;
            world.cell_mut(2, y).terrace = terrace_for(0.2);
            for x in 3..5 {
                world.cell_mut(x, y).height = 0.9;
                world.cell_mut(x, y).terrace = terrace_for(0.9);
            }
        }
        let mut spawned = Vec::new();
        let mut cloud = Cloud::new(30.0, Compass::East, world.idx(0, 1));

        cloud.update(&mut world, &mut spawned); // onto (1,1), flat
        assert!(spawned.is_empty());
        cloud.update(&mut world, &mut spawned); // up the first terrace: split
        assert_eq!(spawned.len(), 2, "terrace step must spawn two siblings");
        assert_relative_eq!(spawned[0].moisture, (30.0 - RAIN) / 3.0, epsilon = 1e-9);

        // The second terrace rise must not split again.
        spawned.clear();
        cloud.update(&mut world, &mut spawned);
        assert!(spawned.is_empty());
    }

    #[test]
    fn advection_deposits_only_on_land() {
        let mut world = flat_land(8, 8, 0.2);
        for y in 0..8 {
            world.cell_mut(0, y).height = -0.8;
            world.cell_mut(0, y).terrace = terrace_for(-0.8);
        }
        advect_moisture(&mut world, Compass::East, 2.0);

        for y in 0..8 {
            assert_relative_eq!(world.moisture_at(0, y), 0.0);
        }
        let deposited: f64 = world.cells().iter().map(|c| c.moisture).sum();
        assert!(deposited > 0.0);
        assert!(deposited <= 8.0 * 2.0 + 1e-9, "cannot rain more than the clouds carried");
    }
}
