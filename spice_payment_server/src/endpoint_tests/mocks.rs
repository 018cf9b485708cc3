use mockall::mock;
use spice_payment_engine::{
    db_types::{NewOrder, Order, OrderNsu, PaymentConfirmation},
    OrderStore,
    OrderStoreError,
};

mock! {
    pub Store {}
    impl Clone for Store {
        fn clone(&self) -> Self;
    }
    impl OrderStore for Store {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError>;
        async fn fetch_order_by_nsu(&self, order_nsu: &OrderNsu) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_pending_orders(&self) -> Result<Vec<Order>, OrderStoreError>;
        async fn confirm_if_pending(
            &self,
            order_nsu: &OrderNsu,
            confirmation: &PaymentConfirmation,
        ) -> Result<Option<Order>, OrderStoreError>;
    }
}
