// Player tank control: per-tick input intents turned into hull forces and yaw

use crate::actor::Actor;
use crate::config;
use crate::utils;

/// Boolean intents supplied by the input layer once per tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intents {
    pub forward: bool,
    pub reverse: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub fire: bool,
    pub boost: bool,
}

/// Applies movement intents to the player hull. Reads the contact flag left
/// by the previous collision pass: no forward thrust while touching something.
pub fn drive(actor: &mut Actor, intents: &Intents, dt: f32) {
    if actor.dead || dt <= 0.0 {
        return;
    }

    let turn = match (intents.turn_left, intents.turn_right) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    };
    if turn != 0.0 {
        let yaw = utils::wrap_angle(actor.body.yaw() + turn * config::TANK_TURN_RATE * dt);
        actor.body.set_yaw(yaw);
    }

    let thrust = if intents.forward && !actor.is_colliding {
        config::TANK_ENGINE_FORCE
    } else if intents.reverse {
        -config::TANK_REVERSE_FORCE
    } else {
        0.0
    };

    let body = &mut actor.body;
    body.clear_force();
    if thrust != 0.0 {
        let forward = body.forward();
        body.apply_force(forward * thrust);
    } else {
        // Coasting
        let drag = -body.velocity * config::TANK_DRAG;
        body.apply_force(drag);
    }
}

/// Raises the tank's speed limit. Returns false if a boost is already running.
pub fn start_boost(actor: &mut Actor) -> bool {
    let Some(tank) = actor.tank_mut() else {
        return false;
    };
    if tank.boosting {
        return false;
    }
    tank.boosting = true;
    let boosted = tank.base_terminal_velocity * config::BOOST_FACTOR;
    actor.body.set_terminal_velocity(boosted);
    crate::debug_physics!(actor = actor.id, "Boost on, terminal velocity {:.1}", boosted);
    true
}

pub fn end_boost(actor: &mut Actor) {
    let Some(tank) = actor.tank_mut() else {
        return;
    };
    tank.boosting = false;
    let base = tank.base_terminal_velocity;
    actor.body.set_terminal_velocity(base);
    crate::debug_physics!(actor = actor.id, "Boost off");
}
