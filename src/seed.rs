//! Built-in dataset the stores are seeded with at startup.

use crate::models::{Entity, HeelStrike, Kind};
use crate::store::{DefinitionStore, EntityStore};

pub const CADENCE_DEFINITION: &str = "Cadence refers to the number of steps taken per minute. For humans, optimal running cadence is typically around 170-180 steps per minute, with elite sprinters reaching over 200. Animals can have vastly different cadences based on their physiology.";

pub const HEEL_STRIKE_DEFINITION: &str = "Heel strike describes how the foot/paw contacts the ground. 'Low' indicates a forefoot or midfoot landing with minimal heel contact, 'medium' indicates a moderate heel-to-toe transition, 'high' means a pronounced heel-first landing, and 'none' means the heel never contacts the ground (as in some animals).";

pub const VERTICAL_OSCILLATION_DEFINITION: &str = "Vertical oscillation measures the amount of up-and-down movement during running, measured in centimeters. For human runners, lower values (5-8 cm) generally indicate more efficient running form. Animals have widely varying vertical oscillation based on their gait type.";

/// Famous runners first, then animals.
pub fn default_entities() -> EntityStore {
    let rows = [
        (
            "Eliud Kipchoge",
            Kind::Human,
            185,
            HeelStrike::Low,
            6.2,
            "Marathon world record holder",
        ),
        (
            "Usain Bolt",
            Kind::Human,
            260,
            HeelStrike::Medium,
            4.8,
            "Sprinting legend, 100m and 200m world record holder",
        ),
        (
            "Mo Farah",
            Kind::Human,
            180,
            HeelStrike::Low,
            7.0,
            "Multiple Olympic gold medalist in 5000m and 10000m",
        ),
        (
            "Allyson Felix",
            Kind::Human,
            215,
            HeelStrike::Low,
            5.5,
            "Most decorated female track athlete in Olympic history",
        ),
        (
            "Kenenisa Bekele",
            Kind::Human,
            190,
            HeelStrike::Low,
            6.8,
            "Former 5000m and 10000m world record holder",
        ),
        (
            "Cheetah",
            Kind::Animal,
            210,
            HeelStrike::Low,
            12.5,
            "Fastest land animal with a top speed of 70-75 mph",
        ),
        (
            "Horse",
            Kind::Animal,
            150,
            HeelStrike::High,
            10.2,
            "Domesticated mammal used for racing and transportation",
        ),
        (
            "Kangaroo",
            Kind::Animal,
            70,
            HeelStrike::None,
            35.0,
            "Marsupial that moves by hopping with extremely efficient energy return",
        ),
    ];

    let mut store = EntityStore::new();
    for (name, kind, cadence, heel_strike, vo, description) in rows {
        store.upsert(name, Entity::new(kind, cadence, heel_strike, vo, description));
    }
    store
}

pub fn default_definitions() -> DefinitionStore {
    let mut store = DefinitionStore::new();
    store.insert("cadence", CADENCE_DEFINITION);
    store.insert("heel_strike", HEEL_STRIKE_DEFINITION);
    store.insert("vertical_oscillation", VERTICAL_OSCILLATION_DEFINITION);
    store
}
