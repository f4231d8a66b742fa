//! Shared fixtures for unit tests.
//!
//! The seeded dataset, relative to [`as_of`] (2025-03-15):
//!
//! | food | provider | qty | expiry | city | claims |
//! |---|---|---|---|---|---|
//! | 1 Bread | 1 Gonzales Bakery | 20 | 03-20 | Springfield | 1 Completed, 2 Pending |
//! | 2 Milk | 2 Fresh Mart | 15 | 03-10 | Springfield | none |
//! | 3 Pasta | 3 Luigi's Kitchen | 30 | 03-15 | Shelbyville | 3 Completed, 5 Completed |
//! | 4 Chicken Curry | 3 Luigi's Kitchen | 10 | 03-12 | Shelbyville | 4 Cancelled |
//! | 5 Salad | 2 Fresh Mart | 5 | 03-14 | Springfield | none |
//!
//! Provider 4 (Corner Grocer) has no listings; receiver 3 (Jordan Lee) has
//! no claims.

use chrono::{NaiveDate, NaiveDateTime};

use crate::model::{Claim, ClaimStatus, FoodListing, Provider, Receiver};
use crate::storage::{DeletePolicy, Storage};

/// Reference date for the seeded dataset.
pub fn as_of() -> NaiveDate {
    date(2025, 3, 15)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    date(2025, 3, day)
        .and_hms_opt(hour, minute, 0)
        .expect("valid time")
}

pub fn provider(id: i64, name: &str, city: &str) -> Provider {
    Provider {
        provider_id: id,
        name: name.to_string(),
        provider_type: Some("Restaurant".to_string()),
        address: Some(format!("{id} Main St")),
        city: Some(city.to_string()),
        contact: Some(format!("555-01{id:02}")),
    }
}

pub fn listing(id: i64, provider_id: i64, quantity: u32, expiry_date: NaiveDate) -> FoodListing {
    FoodListing {
        food_id: id,
        food_name: format!("Item {id}"),
        quantity,
        expiry_date,
        provider_id,
        provider_type: Some("Restaurant".to_string()),
        location: Some("Springfield".to_string()),
        food_type: Some("Vegetarian".to_string()),
        meal_type: Some("Lunch".to_string()),
    }
}

pub fn claim(id: i64, food_id: i64, receiver_id: i64, status: ClaimStatus) -> Claim {
    Claim {
        claim_id: id,
        food_id,
        receiver_id,
        status,
        timestamp: at(1, 12, 0),
    }
}

fn typed_provider(id: i64, name: &str, kind: &str, city: &str) -> Provider {
    Provider {
        provider_type: Some(kind.to_string()),
        ..provider(id, name, city)
    }
}

fn receiver(id: i64, name: &str, kind: &str, city: &str) -> Receiver {
    Receiver {
        receiver_id: id,
        name: name.to_string(),
        receiver_type: Some(kind.to_string()),
        city: Some(city.to_string()),
        contact: Some(format!("555-02{id:02}")),
    }
}

fn food(
    id: i64,
    name: &str,
    quantity: u32,
    expiry_date: NaiveDate,
    provider: &Provider,
    food_type: &str,
    meal_type: &str,
) -> FoodListing {
    FoodListing {
        food_id: id,
        food_name: name.to_string(),
        quantity,
        expiry_date,
        provider_id: provider.provider_id,
        provider_type: provider.provider_type.clone(),
        location: provider.city.clone(),
        food_type: Some(food_type.to_string()),
        meal_type: Some(meal_type.to_string()),
    }
}

/// An in-memory store holding the dataset described in the module docs.
pub fn seeded_storage(policy: DeletePolicy) -> Storage {
    crate::logging::init_test_logging();
    let storage = Storage::open_in_memory(policy).expect("in-memory storage");

    let bakery = typed_provider(1, "Gonzales Bakery", "Bakery", "Springfield");
    let mart = typed_provider(2, "Fresh Mart", "Supermarket", "Springfield");
    let kitchen = typed_provider(3, "Luigi's Kitchen", "Restaurant", "Shelbyville");
    let grocer = typed_provider(4, "Corner Grocer", "Grocery Store", "Ogdenville");
    for p in [&bakery, &mart, &kitchen, &grocer] {
        storage.providers().insert(p).expect("insert provider");
    }

    for r in [
        receiver(1, "Helping Hands", "NGO", "Springfield"),
        receiver(2, "City Shelter", "Shelter", "Shelbyville"),
        receiver(3, "Jordan Lee", "Individual", "Springfield"),
    ] {
        storage.receivers().insert(&r).expect("insert receiver");
    }

    for l in [
        food(1, "Bread", 20, date(2025, 3, 20), &bakery, "Vegetarian", "Breakfast"),
        food(2, "Milk", 15, date(2025, 3, 10), &mart, "Vegetarian", "Breakfast"),
        food(3, "Pasta", 30, date(2025, 3, 15), &kitchen, "Vegetarian", "Dinner"),
        food(4, "Chicken Curry", 10, date(2025, 3, 12), &kitchen, "Non-Vegetarian", "Lunch"),
        food(5, "Salad", 5, date(2025, 3, 14), &mart, "Vegan", "Lunch"),
    ] {
        storage.listings().insert(&l).expect("insert listing");
    }

    for c in [
        Claim {
            timestamp: at(11, 10, 0),
            ..claim(1, 1, 1, ClaimStatus::Completed)
        },
        Claim {
            timestamp: at(12, 9, 30),
            ..claim(2, 1, 2, ClaimStatus::Pending)
        },
        Claim {
            timestamp: at(13, 18, 0),
            ..claim(3, 3, 1, ClaimStatus::Completed)
        },
        Claim {
            timestamp: at(12, 12, 0),
            ..claim(4, 4, 2, ClaimStatus::Cancelled)
        },
        Claim {
            timestamp: at(14, 19, 15),
            ..claim(5, 3, 2, ClaimStatus::Completed)
        },
    ] {
        storage.claims().insert(&c).expect("insert claim");
    }

    storage
}
