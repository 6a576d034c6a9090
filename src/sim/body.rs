//! Vertical physics for the player
//!
//! Both functions take the actor by value and return the new one, so the
//! rules can be checked without any surrounding session.

use super::state::Actor;

/// Advance the actor by one tick under gravity.
///
/// Position moves by the current velocity first. Landing at or below the
/// ground clamps the position and kills the velocity; otherwise gravity is
/// applied, bounded below by `max_fall_speed` (a negative number).
pub fn integrate(actor: Actor, gravity: f32, max_fall_speed: f32, ground_y: f32) -> Actor {
    let y = actor.y + actor.vy;
    let jump_ticks = actor.jump_ticks.saturating_sub(1);

    if y <= ground_y {
        Actor {
            y: ground_y,
            vy: 0.0,
            airborne: false,
            jump_ticks,
        }
    } else {
        Actor {
            y,
            vy: (actor.vy - gravity).max(max_fall_speed),
            airborne: true,
            jump_ticks,
        }
    }
}

/// Try to jump. Returns `None` when the actor is not close enough to the
/// ground; repeated presses mid-air are simply dropped.
pub fn jump(actor: Actor, jump_force: f32, ground_y: f32, epsilon: f32) -> Option<Actor> {
    if actor.y > ground_y + epsilon {
        return None;
    }
    Some(Actor {
        vy: jump_force,
        ..actor
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use proptest::prelude::*;

    fn step(actor: Actor) -> Actor {
        integrate(actor, GRAVITY, MAX_FALL_SPEED, GROUND_Y)
    }

    #[test]
    fn test_grounded_actor_stays_put() {
        let actor = step(Actor::grounded(GROUND_Y));
        assert_eq!(actor.y, GROUND_Y);
        assert_eq!(actor.vy, 0.0);
        assert!(!actor.airborne);
    }

    #[test]
    fn test_jump_then_integrate() {
        let actor = jump(Actor::grounded(GROUND_Y), JUMP_FORCE, GROUND_Y, GROUNDED_EPSILON)
            .expect("grounded jump is accepted");
        let actor = step(actor);
        assert!((actor.vy - (JUMP_FORCE - GRAVITY)).abs() < 1e-5);
        assert!(actor.airborne);
        assert_eq!(actor.y, GROUND_Y + JUMP_FORCE);
    }

    #[test]
    fn test_jump_lands_again() {
        let mut actor =
            jump(Actor::grounded(GROUND_Y), JUMP_FORCE, GROUND_Y, GROUNDED_EPSILON).unwrap();
        let mut ticks = 0;
        loop {
            actor = step(actor);
            ticks += 1;
            if !actor.airborne {
                break;
            }
            assert!(ticks < 200, "actor never landed");
        }
        assert_eq!(actor.y, GROUND_Y);
        assert_eq!(actor.vy, 0.0);
    }

    #[test]
    fn test_airborne_jump_is_ignored() {
        let actor = Actor {
            y: GROUND_Y + 50.0,
            vy: 3.0,
            airborne: true,
            jump_ticks: 0,
        };
        assert!(jump(actor, JUMP_FORCE, GROUND_Y, GROUNDED_EPSILON).is_none());
    }

    #[test]
    fn test_fall_speed_is_capped() {
        let mut actor = Actor {
            y: 10_000.0,
            vy: 0.0,
            airborne: true,
            jump_ticks: 0,
        };
        for _ in 0..100 {
            actor = step(actor);
        }
        assert_eq!(actor.vy, MAX_FALL_SPEED);
    }

    proptest! {
        #[test]
        fn prop_never_below_ground_and_velocity_non_increasing(
            y in GROUND_Y..2000.0f32,
            vy in MAX_FALL_SPEED..30.0f32,
            ticks in 1usize..300,
        ) {
            let mut actor = Actor { y, vy, airborne: y > GROUND_Y, jump_ticks: 0 };
            for _ in 0..ticks {
                let next = step(actor);
                prop_assert!(next.y >= GROUND_Y);
                prop_assert!(next.vy >= MAX_FALL_SPEED);
                if next.airborne {
                    prop_assert!(next.vy <= actor.vy);
                } else {
                    prop_assert_eq!(next.vy, 0.0);
                }
                actor = next;
            }
        }

        #[test]
        fn prop_airborne_jump_matches_plain_integrate(
            y in (GROUND_Y + GROUNDED_EPSILON + 0.01)..2000.0f32,
            vy in MAX_FALL_SPEED..30.0f32,
        ) {
            let actor = Actor { y, vy, airborne: true, jump_ticks: 0 };
            let with_jump = jump(actor, JUMP_FORCE, GROUND_Y, GROUNDED_EPSILON).unwrap_or(actor);
            prop_assert_eq!(step(with_jump), step(actor));
        }
    }
}
