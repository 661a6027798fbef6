use crate::domain::character::Animation;
use crate::domain::state::Vec2;

// Port for the physics/render collaborator that owns the character's body.
// The state machine queries ground contact and issues velocity/position commands
// through it; integration and collision stay on the other side.
pub trait CharacterBody {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, position: Vec2);
    fn velocity(&self) -> Vec2;
    fn set_velocity(&mut self, velocity: Vec2);
    fn is_grounded(&self) -> bool;
    fn facing_left(&self) -> bool;
    fn set_facing_left(&mut self, facing_left: bool);

    // Bodies without a renderer attached can ignore animation requests.
    fn play_animation(&mut self, _animation: Animation) {}
}
