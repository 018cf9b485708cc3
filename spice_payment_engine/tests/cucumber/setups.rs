use cucumber::given;

use crate::cucumber::{spice_world::ReconciliationSystem, SpiceWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut SpiceWorld) {
    let system = ReconciliationSystem::new().await;
    world.system = Some(system);
}
