use crate::ai::AiController;
use crate::building::Building;
use crate::config;
use crate::error::SimError;
use crate::types::{ActorId, BoundingSphere, Category, ProjectileKind};
use crate::utils;
use glam::{Mat4, Quat, Vec3};
use std::cell::Cell;

/// How a body advances each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integration {
    /// Velocity-Verlet step from accumulated force, clamped to terminal velocity
    ForceDriven,
    /// Position is assigned `velocity * dt` outright, not accumulated.
    /// Nothing in the arena moves this way.
    Kinematic,
    /// Never integrated (buildings)
    Static,
}

/// Kinematic state and bounding volume of an actor
#[derive(Debug, Clone)]
pub struct Body {
    position: Vec3,
    prev_position: Vec3,
    orientation: Quat,
    scale: f32,
    /// Public because velocity and force leave the bounding sphere alone until the next integration
    pub velocity: Vec3,
    pub force: Vec3,
    acceleration: Vec3,
    mass: f32,
    terminal_velocity: f32,
    integration: Integration,
    model_radius: f32,  // Model-space bounding sphere radius
    last_dt: f32,       // Step length of the most recent integration
    bounds: Cell<Option<BoundingSphere>>, // None while dirty
}

impl Body {
    /// Mass and scale must be positive; anything else is a configuration error.
    pub fn new(
        position: Vec3,
        mass: f32,
        terminal_velocity: f32,
        scale: f32,
        model_radius: f32,
        integration: Integration,
    ) -> Result<Self, SimError> {
        if !(mass > 0.0) {
            return Err(SimError::NonPositiveMass(mass));
        }
        if !(scale > 0.0) {
            return Err(SimError::NonPositiveScale(scale));
        }
        Ok(Body {
            position,
            prev_position: position,
            orientation: Quat::IDENTITY,
            scale,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            mass,
            terminal_velocity: terminal_velocity.max(0.0),
            integration,
            model_radius,
            last_dt: 0.0,
            bounds: Cell::new(None),
        })
    }

    fn mark_dirty(&self) {
        self.bounds.set(None);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.mark_dirty();
    }

    /// Position before the most recent integration step
    pub fn prev_position(&self) -> Vec3 {
        self.prev_position
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
        self.mark_dirty();
    }

    pub fn yaw(&self) -> f32 {
        utils::yaw_of(self.orientation)
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.set_orientation(Quat::from_rotation_y(yaw));
    }

    /// Unit vector the hull faces
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) -> Result<(), SimError> {
        if !(scale > 0.0) {
            return Err(SimError::NonPositiveScale(scale));
        }
        self.scale = scale;
        self.mark_dirty();
        Ok(())
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    pub fn terminal_velocity(&self) -> f32 {
        self.terminal_velocity
    }

    pub fn set_terminal_velocity(&mut self, terminal_velocity: f32) {
        self.terminal_velocity = terminal_velocity.max(0.0);
    }

    pub fn integration(&self) -> Integration {
        self.integration
    }

    pub fn last_dt(&self) -> f32 {
        self.last_dt
    }

    pub fn apply_force(&mut self, force: Vec3) {
        self.force += force;
    }

    pub fn clear_force(&mut self) {
        self.force = Vec3::ZERO;
    }

    /// Advances the body by `dt` seconds. A zero step leaves everything untouched.
    pub fn integrate(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        match self.integration {
            Integration::Static => return,
            Integration::ForceDriven => {
                let half_dt = dt * 0.5;
                self.velocity += self.acceleration * half_dt;
                self.prev_position = self.position;
                self.position += self.velocity * dt;
                self.acceleration = self.force / self.mass;
                self.velocity += self.acceleration * half_dt;

                if self.velocity.length() >= self.terminal_velocity {
                    self.velocity = self.velocity.normalize_or_zero() * self.terminal_velocity;
                }
            }
            Integration::Kinematic => {
                self.prev_position = self.position;
                self.position = self.velocity * dt;
            }
        }

        self.last_dt = dt;
        self.mark_dirty();
    }

    /// Undo the last step: back to the previous position, at rest
    pub fn bounce_back(&mut self) {
        self.velocity = Vec3::ZERO;
        self.set_position(self.prev_position);
    }

    /// Replay the last step from the previous position with the current velocity
    pub fn replay_step(&mut self) {
        let replayed = self.prev_position + self.velocity * self.last_dt;
        self.set_position(replayed);
    }

    /// World bounding sphere, recomputed on first use after any transform change
    pub fn bounds(&self) -> BoundingSphere {
        if let Some(cached) = self.bounds.get() {
            return cached;
        }
        let sphere = BoundingSphere {
            center: self.position,
            radius: self.model_radius * self.scale,
        };
        self.bounds.set(Some(sphere));
        sphere
    }

    /// Scale/rotation/translation transform for the renderer
    pub fn world_transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.orientation,
            self.position,
        )
    }
}

/// Combat state shared by player and AI tanks
#[derive(Debug, Clone)]
pub struct Tank {
    pub health: f32,
    pub weapon_ready: bool,
    pub boosting: bool,
    pub base_terminal_velocity: f32,
}

impl Tank {
    pub fn new() -> Self {
        Tank {
            health: config::TANK_MAX_HEALTH,
            weapon_ready: true,
            boosting: false,
            base_terminal_velocity: config::TANK_TERMINAL_VELOCITY,
        }
    }

    /// Applies damage, returns true if this hit destroyed the tank
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.health <= 0.0 {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        self.health <= 0.0
    }
}

impl Default for Tank {
    fn default() -> Self {
        Self::new()
    }
}

/// A shell or missile in flight
#[derive(Debug, Clone)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub owner: ActorId,
    pub age: f32,
    pub spent: bool, // No more damage: already dealt, or went off on a building or by age
}

impl Projectile {
    pub fn damage(&self) -> f32 {
        match self.kind {
            ProjectileKind::Shell => config::SHELL_DAMAGE,
            ProjectileKind::Missile => config::MISSILE_DAMAGE,
        }
    }
}

/// Per-category data. The variant decides the collision category.
#[derive(Debug)]
pub enum ActorKind {
    Prop,
    PlayerTank(Tank),
    AiTank(Tank, Box<AiController>),
    Building(Building),
    Projectile(Projectile),
}

/// Anything simulated in the arena
#[derive(Debug)]
pub struct Actor {
    pub id: ActorId, // Assigned by the arena on spawn
    pub body: Body,
    pub kind: ActorKind,
    pub dead: bool,
    pub is_colliding: bool, // Set by the collision pass, cleared at the start of each tick
}

impl Actor {
    pub fn new(body: Body, kind: ActorKind) -> Self {
        Actor {
            id: ActorId(0),
            body,
            kind,
            dead: false,
            is_colliding: false,
        }
    }

    fn tank_body(position: Vec3, yaw: f32) -> Result<Body, SimError> {
        let mut body = Body::new(
            position,
            config::TANK_MASS,
            config::TANK_TERMINAL_VELOCITY,
            config::TANK_SCALE,
            config::TANK_MODEL_RADIUS,
            Integration::ForceDriven,
        )?;
        body.set_yaw(yaw);
        Ok(body)
    }

    pub fn player_tank(position: Vec3, yaw: f32) -> Result<Self, SimError> {
        Ok(Actor::new(
            Self::tank_body(position, yaw)?,
            ActorKind::PlayerTank(Tank::new()),
        ))
    }

    pub fn ai_tank(position: Vec3, yaw: f32, brain: AiController) -> Result<Self, SimError> {
        Ok(Actor::new(
            Self::tank_body(position, yaw)?,
            ActorKind::AiTank(Tank::new(), Box::new(brain)),
        ))
    }

    /// Projectile leaving `origin` along `heading` (unit vector on XZ)
    pub fn projectile(
        kind: ProjectileKind,
        owner: ActorId,
        origin: Vec3,
        heading: Vec3,
    ) -> Result<Self, SimError> {
        let speed = match kind {
            ProjectileKind::Shell => config::SHELL_SPEED,
            ProjectileKind::Missile => config::MISSILE_SPEED,
        };
        let mut body = Body::new(
            origin,
            config::PROJECTILE_MASS,
            speed,
            1.0,
            config::PROJECTILE_MODEL_RADIUS,
            Integration::ForceDriven,
        )?;
        body.set_yaw(utils::yaw_of_direction(heading));
        body.velocity = heading * speed;
        Ok(Actor::new(
            body,
            ActorKind::Projectile(Projectile {
                kind,
                owner,
                age: 0.0,
                spent: false,
            }),
        ))
    }

    pub fn building(building: Building) -> Result<Self, SimError> {
        let body = Body::new(
            building.center(),
            1.0,
            0.0,
            1.0,
            building.enclosing_radius(),
            Integration::Static,
        )?;
        Ok(Actor::new(body, ActorKind::Building(building)))
    }

    pub fn category(&self) -> Category {
        match &self.kind {
            ActorKind::Prop => Category::NonColliding,
            ActorKind::PlayerTank(_) => Category::PlayerTank,
            ActorKind::AiTank(..) => Category::AiTank,
            ActorKind::Building(_) => Category::Building,
            ActorKind::Projectile(p) => match p.kind {
                ProjectileKind::Shell => Category::Shell,
                ProjectileKind::Missile => Category::Missile,
            },
        }
    }

    pub fn tank(&self) -> Option<&Tank> {
        match &self.kind {
            ActorKind::PlayerTank(tank) | ActorKind::AiTank(tank, _) => Some(tank),
            _ => None,
        }
    }

    pub fn tank_mut(&mut self) -> Option<&mut Tank> {
        match &mut self.kind {
            ActorKind::PlayerTank(tank) | ActorKind::AiTank(tank, _) => Some(tank),
            _ => None,
        }
    }

    pub fn projectile_state(&self) -> Option<&Projectile> {
        match &self.kind {
            ActorKind::Projectile(p) => Some(p),
            _ => None,
        }
    }

    pub fn brain(&self) -> Option<&AiController> {
        match &self.kind {
            ActorKind::AiTank(_, brain) => Some(brain),
            _ => None,
        }
    }

    pub fn building_data(&self) -> Option<&Building> {
        match &self.kind {
            ActorKind::Building(b) => Some(b),
            _ => None,
        }
    }

    /// Whether the broad phase should pair this actor this tick. Dead
    /// projectiles stay in for their cleanup tick so a tank can still read them.
    pub fn participates_in_collision(&self) -> bool {
        let category = self.category();
        category != Category::NonColliding && (!self.dead || category.is_projectile())
    }

    /// Physics step. Dead actors no longer move; projectiles age and detonate
    /// once their lifetime runs out.
    pub fn update_physics(&mut self, dt: f32) {
        if self.dead || dt <= 0.0 {
            return;
        }
        self.body.integrate(dt);

        if let ActorKind::Projectile(p) = &mut self.kind {
            p.age += dt;
            if p.age >= config::PROJECTILE_LIFETIME {
                crate::debug_physics!(actor = self.id, "Projectile expired after {:.2}s", p.age);
                p.spent = true;
                self.dead = true;
            }
        }
        crate::debug_physics!(
            actor = self.id,
            "pos ({:.2}, {:.2}, {:.2}) vel ({:.2}, {:.2}, {:.2})",
            self.body.position.x,
            self.body.position.y,
            self.body.position.z,
            self.body.velocity.x,
            self.body.velocity.y,
            self.body.velocity.z
        );
    }

    pub fn bounds(&self) -> BoundingSphere {
        self.body.bounds()
    }

    pub fn world_transform(&self) -> Mat4 {
        self.body.world_transform()
    }
}
