use super::*;

const R1: &str = "rest-1";
const R2: &str = "rest-2";

const DOSA: &str = "m-dosa";
const CHAI: &str = "m-chai";
const IDLI: &str = "m-idli";

fn create_test_manager() -> OrdersManager {
    let storage = OrderStorage::open_in_memory().unwrap();
    let manager = OrdersManager::with_storage(storage);
    seed_menu(&manager, R1);
    manager
}

// ========================================================================
// Helper: menu / stock seeding
// ========================================================================

fn seed_menu(manager: &OrdersManager, restaurant_id: &str) {
    for (id, name, price) in [
        (DOSA, "Masala Dosa", 120.0),
        (CHAI, "Masala Chai", 25.5),
        (IDLI, "Idli Sambar", 60.0),
    ] {
        manager
            .upsert_menu_item(
                restaurant_id,
                id,
                &MenuItemUpsert {
                    name: name.to_string(),
                    price,
                },
            )
            .unwrap();
    }
}

fn seed_stock(manager: &OrdersManager, restaurant_id: &str, menu_item_id: &str, quantity: f64) {
    manager
        .set_stock(
            restaurant_id,
            menu_item_id,
            &StockUpdate {
                quantity,
                unit: Some("plate".to_string()),
                min_level: Some(2.0),
                max_level: None,
            },
        )
        .unwrap();
}

fn stock_of(manager: &OrdersManager, restaurant_id: &str, menu_item_id: &str) -> f64 {
    manager
        .get_stock(restaurant_id, menu_item_id)
        .unwrap()
        .expect("stock entry")
        .quantity
}

// ========================================================================
// Helper: order creation
// ========================================================================

fn line(menu_item_id: &str, quantity: u32) -> OrderItemInput {
    OrderItemInput {
        menu_item_id: menu_item_id.to_string(),
        quantity,
        notes: None,
    }
}

fn table_request(table_id: &str, items: Vec<OrderItemInput>) -> CreateOrderRequest {
    CreateOrderRequest {
        table_id: Some(table_id.to_string()),
        table_number: Some(table_id.trim_start_matches("t-").to_string()),
        items,
        notes: None,
    }
}

fn create_order(manager: &OrdersManager, items: Vec<OrderItemInput>) -> Order {
    manager
        .create_order(R1, Some("waiter-1"), &table_request("t-4", items))
        .unwrap()
}

mod test_boundary;
mod test_core;
