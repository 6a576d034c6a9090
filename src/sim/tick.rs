//! Fixed timestep simulation tick
//!
//! Core game loop that advances one session deterministically. Order within a
//! tick matters: physics, then the field (advance, spawn, scoring), then the
//! collision check against the already-moved obstacles.

use super::body::{integrate, jump};
use super::collision::collides;
use super::state::GameState;
use crate::tuning::Tuning;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Jump pressed since the previous tick (edge, not level)
    pub jump: bool,
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// A jump press was accepted
    pub jumped: bool,
    /// A jump press arrived while airborne and was dropped
    pub jump_ignored: bool,
    /// Obstacles passed this tick (points earned)
    pub passed: u32,
    /// Id of the obstacle spawned this tick
    pub spawned: Option<u32>,
    /// Scroll speed changed this tick
    pub speed_up: bool,
    /// The player hit an obstacle; the run is over
    pub collided: bool,
}

/// Advance the game state by one tick
pub fn tick(state: &mut GameState, input: &TickInput, tuning: &Tuning) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    state.time_ticks += 1;

    if input.jump {
        match jump(
            state.actor,
            tuning.jump_force,
            tuning.ground_y,
            tuning.grounded_epsilon,
        ) {
            Some(actor) => {
                state.actor = actor;
                state.actor.jump_ticks = tuning.jump_duration_ticks();
                outcome.jumped = true;
            }
            None => outcome.jump_ignored = true,
        }
    }

    // 1. Physics
    state.actor = integrate(
        state.actor,
        tuning.gravity,
        tuning.max_fall_speed,
        tuning.ground_y,
    );

    // 2. Obstacles
    state.field.advance(tuning.obstacle_width);
    outcome.spawned = state.field.maybe_spawn(&mut state.rng, tuning);
    outcome.passed = state
        .field
        .detect_passed(tuning.player_x, tuning.obstacle_width);

    if outcome.passed > 0 {
        state.score += outcome.passed;
        let speed = tuning.speed_for_score(state.score);
        if speed != state.field.speed() {
            log::debug!("Score {} - speed {} -> {}", state.score, state.field.speed(), speed);
            state.field.set_speed(speed);
            outcome.speed_up = true;
        }
    }

    // 3. Collision
    outcome.collided = collides(&state.actor, state.field.obstacles(), tuning);

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;

    #[test]
    fn test_first_tick_spawns_at_edge() {
        let tuning = Tuning::default();
        let mut state = GameState::new(12345, &tuning);
        let outcome = tick(&mut state, &TickInput::default(), &tuning);

        assert_eq!(outcome.spawned, Some(0));
        assert!(!outcome.collided);
        assert_eq!(state.field.obstacles()[0].x, SPAWN_X);
    }

    #[test]
    fn test_jump_input_is_edge_triggered() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1, &tuning);

        let press = TickInput { jump: true };
        let outcome = tick(&mut state, &press, &tuning);
        assert!(outcome.jumped);
        assert!(state.actor.airborne);
        assert!(state.actor.is_jumping());
        let vy_after_first = state.actor.vy;

        // Pressing again mid-air changes nothing beyond plain integration
        let mut twin = state.clone();
        let a = tick(&mut state, &press, &tuning);
        tick(&mut twin, &TickInput::default(), &tuning);
        assert!(a.jump_ignored);
        assert_eq!(state.actor, twin.actor);
        assert!(state.actor.vy < vy_after_first);
    }

    #[test]
    fn test_unjumped_runner_eventually_crashes() {
        let tuning = Tuning::default();
        let mut state = GameState::new(3, &tuning);
        let mut crashed = false;
        for _ in 0..1_000 {
            if tick(&mut state, &TickInput::default(), &tuning).collided {
                crashed = true;
                break;
            }
        }
        assert!(crashed);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_collision_sees_moved_obstacles() {
        let tuning = Tuning::default();
        let mut state = GameState::new(4, &tuning);
        // One step short of the hitbox: only overlaps after this tick's advance
        let x = PLAYER_X + PLAYER_SIZE - PLAYER_HITBOX_INSET;
        state.field.push(x, 50.0);
        let outcome = tick(&mut state, &TickInput::default(), &tuning);
        assert!(outcome.collided);
    }

    #[test]
    fn test_scoring_speeds_up_every_five_points() {
        let tuning = Tuning::default();
        let mut state = GameState::new(5, &tuning);
        state.score = 4;
        // Already behind the player and about to cross
        state.field.push(PLAYER_X - OBSTACLE_WIDTH + 1.0, 10.0);
        // Keep the player clear of it
        state.actor.y = GROUND_Y + 200.0;
        state.actor.airborne = true;

        let outcome = tick(&mut state, &TickInput::default(), &tuning);
        assert_eq!(outcome.passed, 1);
        assert_eq!(state.score, 5);
        assert!(outcome.speed_up);
        assert_eq!(state.speed(), BASE_SPEED + SPEED_STEP);
    }

    #[test]
    fn test_determinism() {
        let tuning = Tuning::default();
        let mut state1 = GameState::new(99999, &tuning);
        let mut state2 = GameState::new(99999, &tuning);

        for i in 0..500 {
            let input = TickInput { jump: i % 37 == 0 };
            let a = tick(&mut state1, &input, &tuning);
            let b = tick(&mut state2, &input, &tuning);
            assert_eq!(a, b);
        }
        assert_eq!(state1.actor, state2.actor);
        assert_eq!(state1.field, state2.field);
        assert_eq!(state1.score, state2.score);
    }
}
