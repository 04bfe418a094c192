use super::*;
use crate::orders::money::MAX_QUANTITY;
use shared::order::PaymentMethod;

// ========================================================================
// 输入校验
// ========================================================================

#[test]
fn test_empty_order_rejected() {
    let manager = create_test_manager();

    let err = manager
        .create_order(R1, None, &table_request("t-1", vec![]))
        .unwrap_err();

    assert!(matches!(err, ManagerError::EmptyOrder));
    assert_eq!(manager.storage().order_count().unwrap(), 0);
}

#[test]
fn test_quantity_bounds() {
    let manager = create_test_manager();

    let err = manager
        .create_order(R1, None, &table_request("t-1", vec![line(DOSA, 0)]))
        .unwrap_err();
    assert!(matches!(err, ManagerError::InvalidQuantity(_)));

    let err = manager
        .create_order(
            R1,
            None,
            &table_request("t-1", vec![line(DOSA, MAX_QUANTITY + 1)]),
        )
        .unwrap_err();
    assert!(matches!(err, ManagerError::InvalidQuantity(_)));
}

#[test]
fn test_unknown_menu_item_rolls_back_everything() {
    let manager = create_test_manager();
    seed_stock(&manager, R1, DOSA, 10.0);

    let err = manager
        .create_order(
            R1,
            None,
            &table_request("t-1", vec![line(DOSA, 3), line("m-ghost", 1)]),
        )
        .unwrap_err();

    assert!(matches!(err, ManagerError::MenuItemNotFound(ref id) if id == "m-ghost"));
    // 第一行的扣减与订单行一起回滚
    assert_eq!(stock_of(&manager, R1, DOSA), 10.0);
    assert_eq!(manager.storage().order_count().unwrap(), 0);

    // 失败的创建不消耗单号
    let order = create_order(&manager, vec![line(DOSA, 1)]);
    assert_eq!(order.order_number, 1);
}

#[test]
fn test_menu_of_other_restaurant_is_invisible() {
    let manager = create_test_manager();

    let err = manager
        .create_order(R2, None, &table_request("t-1", vec![line(DOSA, 1)]))
        .unwrap_err();

    assert!(matches!(err, ManagerError::MenuItemNotFound(_)));
}

#[test]
fn test_cancelled_is_not_assignable_item_status() {
    let manager = create_test_manager();
    let order = create_order(&manager, vec![line(DOSA, 1)]);

    let err = manager
        .update_item_status(R1, &order.id, &order.items[0].id, ItemStatus::Cancelled)
        .unwrap_err();

    assert!(matches!(err, ManagerError::InvalidItemStatus(_)));
}

#[test]
fn test_item_status_allowed_on_completed_order() {
    let manager = create_test_manager();
    let order = create_order(&manager, vec![line(DOSA, 1)]);
    manager.complete_order(R1, &order.id).unwrap();

    let updated = manager
        .update_item_status(R1, &order.id, &order.items[0].id, ItemStatus::Served)
        .unwrap();

    assert_eq!(updated.status, OrderStatus::Completed);
    assert_eq!(updated.items[0].status, ItemStatus::Served);
}

#[test]
fn test_invalid_payment_leaves_order_pending() {
    let manager = create_test_manager();
    let order = create_order(&manager, vec![line(DOSA, 1)]);

    let err = manager
        .complete_order_with_payment(
            R1,
            &order.id,
            Payment {
                method: PaymentMethod::Cash,
                amount_received: 0.0,
                change_returned: 0.0,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ManagerError::InvalidAmount(_)));

    let err = manager
        .complete_order_with_payment(
            R1,
            &order.id,
            Payment {
                method: PaymentMethod::Upi,
                amount_received: f64::NAN,
                change_returned: 0.0,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ManagerError::InvalidAmount(_)));

    assert_eq!(
        manager.get_order(R1, &order.id).unwrap().status,
        OrderStatus::Pending
    );
}

#[test]
fn test_inventory_may_go_negative() {
    let manager = create_test_manager();
    seed_stock(&manager, R1, DOSA, 1.0);

    create_order(&manager, vec![line(DOSA, 3)]);

    let entry = manager.get_stock(R1, DOSA).unwrap().unwrap();
    assert_eq!(entry.quantity, -2.0);
    assert!(entry.is_low());
}

#[test]
fn test_set_stock_rejects_non_finite() {
    let manager = create_test_manager();

    let err = manager
        .set_stock(
            R1,
            DOSA,
            &StockUpdate {
                quantity: f64::INFINITY,
                unit: None,
                min_level: None,
                max_level: None,
            },
        )
        .unwrap_err();

    assert!(matches!(err, ManagerError::InvalidQuantity(_)));
    assert!(manager.get_stock(R1, DOSA).unwrap().is_none());
}

#[test]
fn test_menu_upsert_validation() {
    let manager = create_test_manager();

    let err = manager
        .upsert_menu_item(
            R1,
            "m-free",
            &MenuItemUpsert {
                name: "Water".to_string(),
                price: -1.0,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ManagerError::InvalidPrice(_)));

    let err = manager
        .upsert_menu_item(
            R1,
            "m-blank",
            &MenuItemUpsert {
                name: "  ".to_string(),
                price: 10.0,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ManagerError::InvalidOperation(_)));

    assert!(matches!(
        manager.get_menu_item(R1, "m-free"),
        Err(ManagerError::MenuItemNotFound(_))
    ));
}

// ========================================================================
// 分页与税率
// ========================================================================

#[test]
fn test_list_limit_defaults_and_cap() {
    let manager = create_test_storage_manager_with_limits(3, 4);
    for _ in 0..6 {
        create_order(&manager, vec![line(IDLI, 1)]);
    }

    assert_eq!(manager.list_orders(R1, None, None, 0).unwrap().orders.len(), 3);
    assert_eq!(manager.list_orders(R1, None, Some(0), 0).unwrap().orders.len(), 3);
    assert_eq!(manager.list_orders(R1, None, Some(50), 0).unwrap().orders.len(), 4);

    let beyond = manager.list_orders(R1, None, Some(2), 10).unwrap();
    assert!(beyond.orders.is_empty());
    assert_eq!(beyond.count, 6);
}

#[test]
fn test_custom_tax_rate() {
    let manager = create_test_manager().with_tax_rate(0.18);

    let order = create_order(&manager, vec![line(CHAI, 1)]);

    // 25.5 × 0.18 = 4.59
    assert_eq!(order.tax_amount, 4.59);
    assert_eq!(order.total, 30.09);
}

#[test]
fn test_money_rounding_half_away_from_zero() {
    let manager = create_test_manager();

    // 25.5 × 0.05 = 1.275 → 1.28
    let order = create_order(&manager, vec![line(CHAI, 1)]);

    assert_eq!(order.tax_amount, 1.28);
    assert_eq!(order.total, 26.78);
}

fn create_test_storage_manager_with_limits(default_limit: usize, max_limit: usize) -> OrdersManager {
    create_test_manager().with_list_limits(default_limit, max_limit)
}
