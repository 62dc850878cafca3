// Built-in scenario catalog served by the mock backend

use crate::models::{Difficulty, Scenario};

struct ScenarioSeed {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    difficulty: Difficulty,
    category: &'static str,
    estimated_minutes: u32,
    is_premium: bool,
}

const SCENARIOS: &[ScenarioSeed] = &[
    ScenarioSeed {
        id: "coffee-shop",
        title: "Coffee Shop",
        description: "Order your favorite drink and practice common cafe interactions",
        difficulty: Difficulty::Beginner,
        category: "Daily Life",
        estimated_minutes: 5,
        is_premium: false,
    },
    ScenarioSeed {
        id: "job-interview",
        title: "Job Interview",
        description: "Practice professional conversation and interview skills",
        difficulty: Difficulty::Intermediate,
        category: "Professional",
        estimated_minutes: 10,
        is_premium: true,
    },
    ScenarioSeed {
        id: "restaurant",
        title: "Restaurant",
        description: "Make reservations, order food, and interact with waitstaff",
        difficulty: Difficulty::Beginner,
        category: "Dining",
        estimated_minutes: 8,
        is_premium: true,
    },
    ScenarioSeed {
        id: "phone-call",
        title: "Phone Call",
        description: "Handle business calls and phone conversations confidently",
        difficulty: Difficulty::Advanced,
        category: "Business",
        estimated_minutes: 12,
        is_premium: true,
    },
    ScenarioSeed {
        id: "doctor-appointment",
        title: "Doctor Appointment",
        description: "Learn to describe symptoms and understand medical advice",
        difficulty: Difficulty::Intermediate,
        category: "Healthcare",
        estimated_minutes: 8,
        is_premium: false,
    },
];

pub fn default_scenarios() -> Vec<Scenario> {
    SCENARIOS.iter().map(to_scenario).collect()
}

pub fn find_scenario(id: &str) -> Option<Scenario> {
    SCENARIOS.iter().find(|seed| seed.id == id).map(to_scenario)
}

fn to_scenario(seed: &ScenarioSeed) -> Scenario {
    Scenario {
        id: seed.id.to_string(),
        title: seed.title.to_string(),
        description: seed.description.to_string(),
        difficulty: seed.difficulty,
        category: seed.category.to_string(),
        estimated_minutes: seed.estimated_minutes,
        is_premium: seed.is_premium,
    }
}
