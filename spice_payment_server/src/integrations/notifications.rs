use futures::future::BoxFuture;
use log::*;
use notification_tools::{NotificationApi, NotificationChannel, NotificationItem, NotificationResult, PaymentNotification};
use spice_payment_engine::{
    db_types::Order,
    events::{EventHooks, OrderPaidEvent},
};

pub const NOTIFICATION_EVENT_BUFFER_SIZE: usize = 50;

/// Registers one order-paid hook per notification channel.
///
/// Every hook gets its own queue, so a slow WhatsApp function never holds up the confirmation emails (and vice versa).
/// Delivery failures are logged and otherwise dropped: a customer notification never affects the payment status.
pub fn create_notification_handlers(api: NotificationApi) -> EventHooks {
    let mut hooks = EventHooks::default();
    for channel in [NotificationChannel::Email, NotificationChannel::WhatsApp] {
        if !api.is_enabled(channel) {
            info!("📣️ No {channel} endpoint is configured. {channel} notifications are disabled.");
            continue;
        }
        let api = api.clone();
        hooks.on_order_paid(format!("{channel} notification"), move |ev| notify(api.clone(), channel, ev));
    }
    hooks
}

fn notify(api: NotificationApi, channel: NotificationChannel, ev: OrderPaidEvent) -> BoxFuture<'static, ()> {
    let notification = notification_for_order(&ev.order);
    Box::pin(async move {
        let nsu = notification.order_nsu.as_str();
        match api.send(channel, &notification).await {
            Ok(NotificationResult::Sent { attempts }) => {
                debug!("📣️ {channel} notification for order {nsu} sent after {attempts} attempt(s)")
            },
            Ok(NotificationResult::Skipped(reason)) => {
                debug!("📣️ {channel} notification for order {nsu} skipped. {reason:?}")
            },
            Err(e) => error!("📣️ Could not send {channel} notification for order {nsu}. {e}"),
        }
    })
}

pub fn notification_for_order(order: &Order) -> PaymentNotification {
    let items = order
        .items
        .iter()
        .map(|item| NotificationItem {
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.unit_price.to_major(),
        })
        .collect();
    PaymentNotification {
        order_nsu: order.order_nsu.as_str().to_string(),
        customer_name: order.customer_name.clone().unwrap_or_else(|| "Cliente".to_string()),
        customer_email: order.customer_email.clone(),
        customer_phone: order.customer_phone.clone(),
        total_amount: order.total_amount.to_major(),
        items,
    }
}
