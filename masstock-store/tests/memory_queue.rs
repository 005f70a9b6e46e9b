use std::time::Duration;

use masstock_store::{JobMessage, JobQueue, MemoryQueue};
use uuid::Uuid;

#[tokio::test(start_paused = true)]
async fn delayed_message_becomes_visible() {
    let queue = MemoryQueue::new();
    let job = JobMessage::first(Uuid::new_v4());
    queue.publish(job, Duration::from_secs(5)).await.unwrap();

    let lease = Duration::from_secs(30);
    assert!(queue.receive(lease).await.unwrap().is_none());

    tokio::time::advance(Duration::from_secs(5)).await;
    let got = queue.receive(lease).await.unwrap().unwrap();
    assert_eq!(got.message, job);
    assert_eq!(got.deliveries, 1);
}

#[tokio::test(start_paused = true)]
async fn leased_message_is_hidden_until_lease_expires() {
    let queue = MemoryQueue::new();
    queue
        .publish(JobMessage::first(Uuid::new_v4()), Duration::ZERO)
        .await
        .unwrap();

    let lease = Duration::from_secs(10);
    let first = queue.receive(lease).await.unwrap().unwrap();
    assert!(queue.receive(lease).await.unwrap().is_none());

    tokio::time::advance(Duration::from_secs(11)).await;
    let again = queue.receive(lease).await.unwrap().unwrap();
    assert_eq!(again.receipt, first.receipt);
    assert_eq!(again.deliveries, 2);

    queue.ack(again.receipt).await.unwrap();
    assert!(queue.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn receives_in_visibility_order() {
    let queue = MemoryQueue::new();
    let late = JobMessage::first(Uuid::new_v4());
    let early = JobMessage::first(Uuid::new_v4());
    queue.publish(late, Duration::from_secs(2)).await.unwrap();
    queue.publish(early, Duration::from_secs(1)).await.unwrap();

    tokio::time::advance(Duration::from_secs(3)).await;
    let lease = Duration::from_secs(30);
    assert_eq!(queue.receive(lease).await.unwrap().unwrap().message, early);
    assert_eq!(queue.receive(lease).await.unwrap().unwrap().message, late);
}
