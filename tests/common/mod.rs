use std::collections::BTreeMap;

use rust_decimal_macros::dec;

use chowdown::config::{DatabaseConfig, OrdersConfig, SearchConfig};
use chowdown::{ChowDao, Config, Eatery, Location, MenuItem};

/// Query origin used throughout the tests: downtown Binghamton, NY.
pub const ORIGIN: Location = Location {
    lat: 42.0987,
    lng: -75.9180,
};

pub fn test_config() -> Config {
    Config {
        database: DatabaseConfig {
            url: "mongodb://localhost:27017".to_string(),
            database_name: "chow_test".to_string(),
        },
        search: SearchConfig {
            default_count: 5,
            origin_lat: ORIGIN.lat,
            origin_lng: ORIGIN.lng,
        },
        orders: OrdersConfig { id_suffix_len: 2 },
    }
}

fn menu_item(name: &str, price: rust_decimal::Decimal) -> MenuItem {
    MenuItem {
        name: name.to_string(),
        price,
        details: String::new(),
    }
}

fn eatery(id: &str, name: &str, cuisine: &str, lat: f64, lng: f64) -> Eatery {
    Eatery {
        id: id.to_string(),
        name: name.to_string(),
        cuisine: cuisine.to_string(),
        loc: Location::new(lat, lng),
        menu_categories: BTreeMap::new(),
        menu_items: BTreeMap::new(),
    }
}

/// Six eateries at increasing distance from [`ORIGIN`]: four Chinese,
/// two Mexican.  Ids carry a dot to exercise storage-key sanitizing.
pub fn sample_eateries() -> Vec<Eatery> {
    let mut jade = eatery("2.01", "Jade Garden", "Chinese", 42.0993, -75.9170);
    jade.menu_categories.insert(
        "Soups".to_string(),
        vec!["wonton".to_string(), "hot-sour".to_string()],
    );
    jade.menu_items
        .insert("wonton".to_string(), menu_item("Wonton Soup", dec!(3.50)));
    jade.menu_items.insert(
        "hot-sour".to_string(),
        menu_item("Hot and Sour Soup", dec!(3.25)),
    );

    vec![
        jade,
        eatery("2.02", "Red Lantern", "Chinese", 42.1050, -75.9100),
        eatery("2.03", "Golden Wok", "Chinese", 42.1200, -75.9000),
        eatery("2.04", "Panda House", "chinese", 42.1500, -75.8800),
        eatery("3.01", "Casa Blanca", "Mexican", 42.1000, -75.9200),
        eatery("3.02", "El Sombrero", "Mexican", 42.0800, -75.9500),
    ]
}

/// In-memory DAO preloaded with [`sample_eateries`].
pub async fn loaded_dao() -> ChowDao {
    let dao = ChowDao::in_memory(&test_config());
    dao.load_eateries(sample_eateries())
        .await
        .unwrap_or_else(|e| panic!("fixture load failed: {:?}", e));
    dao
}
