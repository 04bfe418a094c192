use super::*;
use crate::orders::money::totals_consistent;

// ========================================================================
// Create
// ========================================================================

#[test]
fn test_create_order() {
    let manager = create_test_manager();

    let order = create_order(&manager, vec![line(DOSA, 1), line(CHAI, 2)]);

    assert_eq!(order.order_number, 1);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.restaurant_id, R1);
    assert_eq!(order.table_id.as_deref(), Some("t-4"));
    assert_eq!(order.created_by.as_deref(), Some("waiter-1"));
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.sub_total, 171.0);
    assert_eq!(order.tax_amount, 8.55);
    assert_eq!(order.total, 179.55);
    assert!(totals_consistent(&order));

    let chai = &order.items[1];
    assert_eq!(chai.name, "Masala Chai");
    assert_eq!(chai.unit_rate, 25.5);
    assert_eq!(chai.total, 51.0);
    assert_eq!(chai.status, ItemStatus::Pending);
    assert!(chai.sub_id.is_none());

    // 持久化后读回一致
    let stored = manager.get_order(R1, &order.id).unwrap();
    assert_eq!(stored, order);
}

#[test]
fn test_order_numbers_are_sequential() {
    let manager = create_test_manager();

    let numbers: Vec<u64> = (0..5)
        .map(|_| create_order(&manager, vec![line(IDLI, 1)]).order_number)
        .collect();

    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_order_numbers_are_per_restaurant() {
    let manager = create_test_manager();
    seed_menu(&manager, R2);

    create_order(&manager, vec![line(DOSA, 1)]);
    create_order(&manager, vec![line(DOSA, 1)]);

    let other = manager
        .create_order(R2, None, &table_request("t-1", vec![line(DOSA, 1)]))
        .unwrap();
    assert_eq!(other.order_number, 1);
}

#[test]
fn test_price_snapshot_survives_repricing() {
    let manager = create_test_manager();
    let order = create_order(&manager, vec![line(DOSA, 2)]);

    manager
        .upsert_menu_item(
            R1,
            DOSA,
            &MenuItemUpsert {
                name: "Masala Dosa".to_string(),
                price: 150.0,
            },
        )
        .unwrap();

    let stored = manager.get_order(R1, &order.id).unwrap();
    assert_eq!(stored.items[0].unit_rate, 120.0);
    assert_eq!(stored.sub_total, 240.0);
}

#[test]
fn test_create_deducts_tracked_inventory() {
    let manager = create_test_manager();
    seed_stock(&manager, R1, DOSA, 10.0);

    create_order(&manager, vec![line(DOSA, 3), line(CHAI, 1)]);

    assert_eq!(stock_of(&manager, R1, DOSA), 7.0);
    // 未追踪库存的菜品不生成条目
    assert!(manager.get_stock(R1, CHAI).unwrap().is_none());
}

// ========================================================================
// Complete / Cancel
// ========================================================================

#[test]
fn test_complete_order() {
    let manager = create_test_manager();
    let order = create_order(&manager, vec![line(DOSA, 1)]);

    let completed = manager.complete_order(R1, &order.id).unwrap();

    assert_eq!(completed.status, OrderStatus::Completed);
    assert!(completed.completed_at.is_some());
    assert!(completed.payment_method.is_none());
    assert_eq!(completed.total, order.total);
}

#[test]
fn test_complete_twice_is_rejected() {
    let manager = create_test_manager();
    let order = create_order(&manager, vec![line(DOSA, 1)]);
    manager.complete_order(R1, &order.id).unwrap();

    let err = manager.complete_order(R1, &order.id).unwrap_err();
    assert!(matches!(err, ManagerError::OrderAlreadyCompleted(_)));
}

#[test]
fn test_cancel_restores_inventory() {
    let manager = create_test_manager();
    seed_stock(&manager, R1, DOSA, 10.0);
    seed_stock(&manager, R1, IDLI, 4.0);

    let order = create_order(&manager, vec![line(DOSA, 3), line(IDLI, 2)]);
    assert_eq!(stock_of(&manager, R1, IDLI), 2.0);

    let cancelled = manager.cancel_order(R1, &order.id).unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(cancelled.completed_at.is_none());
    assert_eq!(stock_of(&manager, R1, DOSA), 10.0);
    assert_eq!(stock_of(&manager, R1, IDLI), 4.0);
}

#[test]
fn test_terminal_transitions_are_rejected() {
    let manager = create_test_manager();

    let cancelled = create_order(&manager, vec![line(DOSA, 1)]);
    manager.cancel_order(R1, &cancelled.id).unwrap();
    assert!(matches!(
        manager.cancel_order(R1, &cancelled.id),
        Err(ManagerError::OrderAlreadyCancelled(_))
    ));
    assert!(matches!(
        manager.complete_order(R1, &cancelled.id),
        Err(ManagerError::OrderAlreadyCancelled(_))
    ));

    let completed = create_order(&manager, vec![line(DOSA, 1)]);
    manager.complete_order(R1, &completed.id).unwrap();
    assert!(matches!(
        manager.cancel_order(R1, &completed.id),
        Err(ManagerError::OrderAlreadyCompleted(_))
    ));
}

#[test]
fn test_cancel_twice_does_not_restore_twice() {
    let manager = create_test_manager();
    seed_stock(&manager, R1, DOSA, 10.0);

    let order = create_order(&manager, vec![line(DOSA, 3)]);
    manager.cancel_order(R1, &order.id).unwrap();
    let _ = manager.cancel_order(R1, &order.id);

    assert_eq!(stock_of(&manager, R1, DOSA), 10.0);
}

// ========================================================================
// Item status
// ========================================================================

#[test]
fn test_update_item_status() {
    let manager = create_test_manager();
    let order = create_order(&manager, vec![line(DOSA, 1), line(CHAI, 1)]);
    let item_id = order.items[0].id.clone();

    let updated = manager
        .update_item_status(R1, &order.id, &item_id, ItemStatus::Cooking)
        .unwrap();

    assert_eq!(updated.items[0].status, ItemStatus::Cooking);
    assert_eq!(updated.items[1].status, ItemStatus::Pending);

    let stored = manager.get_order(R1, &order.id).unwrap();
    assert_eq!(stored.items[0].status, ItemStatus::Cooking);
}

#[test]
fn test_update_items_by_menu_item() {
    let manager = create_test_manager();
    let order = create_order(&manager, vec![line(CHAI, 1), line(DOSA, 1)]);
    let order = manager
        .update_order(R1, &order.id, &[line(CHAI, 2)])
        .unwrap();

    let (updated, affected) = manager
        .update_items_by_menu_item(R1, &order.id, CHAI, ItemStatus::Served)
        .unwrap();

    assert_eq!(affected, 2);
    assert_eq!(updated.items[0].status, ItemStatus::Served);
    assert_eq!(updated.items[1].status, ItemStatus::Pending);
    assert_eq!(updated.items[2].status, ItemStatus::Served);
    assert!(!updated.all_items_settled());
}

#[test]
fn test_item_status_on_unknown_item() {
    let manager = create_test_manager();
    let order = create_order(&manager, vec![line(DOSA, 1)]);

    let err = manager
        .update_item_status(R1, &order.id, "missing", ItemStatus::Ready)
        .unwrap_err();
    assert!(matches!(err, ManagerError::ItemNotFound(_)));

    let err = manager
        .update_items_by_menu_item(R1, &order.id, IDLI, ItemStatus::Ready)
        .unwrap_err();
    assert!(matches!(err, ManagerError::ItemNotFound(_)));
}
