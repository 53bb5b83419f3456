pub mod fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use warren_client::prelude::*;

    struct Publish(&'static str);

    impl ClientCommand<FakeChannel> for Publish {
        type Output = usize;

        fn invoke(self, channel: &mut FakeChannel) -> Result<usize, FakeError> {
            channel.publish(self.0)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_creates_one_channel() {
        let broker = Broker::new();
        let factory = CountingFactory::new(&broker);
        let created = Arc::clone(&factory.created);
        let dispatcher = Arc::new(SingleChannelDispatcher::new(factory));
        let barrier = Arc::new(tokio::sync::Barrier::new(16));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let dispatcher = Arc::clone(&dispatcher);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    dispatcher
                        .invoke(Publish("burst"), &ChannelDispatchOptions::PUBLISH, &CancellationToken::new())
                        .await
                })
            })
            .collect();

        let mut counts = Vec::new();
        for task in tasks {
            counts.push(task.await.unwrap().unwrap());
        }
        counts.sort_unstable();

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.channel_count(), 1);
        assert_eq!(broker.opens(), 1);
        assert_eq!(counts, (1..=16).collect::<Vec<_>>(), "every command ran once on the same channel");
    }

    #[tokio::test]
    async fn test_keys_get_independent_channels() {
        let broker = Broker::new();
        let dispatcher = SingleChannelDispatcher::new(CountingFactory::new(&broker));
        let cancel = CancellationToken::new();

        for options in [
            ChannelDispatchOptions::DEFAULT,
            ChannelDispatchOptions::PUBLISH,
            ChannelDispatchOptions::PUBLISH_WITH_CONFIRMS,
            ChannelDispatchOptions::new("Publish", false),
        ] {
            dispatcher.invoke(Publish("x"), &options, &cancel).await.unwrap();
        }

        assert_eq!(dispatcher.channel_count(), 3, "structurally equal keys share a channel");
        let mut confirms = broker.confirms();
        confirms.sort_unstable();
        assert_eq!(confirms, vec![false, false, true]);
    }

    #[tokio::test]
    async fn test_closure_shapes() {
        let broker = Broker::new();
        let dispatcher = SingleChannelDispatcher::new(CountingFactory::new(&broker));
        let cancel = CancellationToken::new();

        dispatcher
            .invoke_action(
                |channel: &mut FakeChannel| channel.publish("action").map(|_| ()),
                &ChannelDispatchOptions::PUBLISH,
                &cancel,
            )
            .await
            .unwrap();

        let published = dispatcher
            .invoke_func(
                |channel: &mut FakeChannel| channel.publish("func"),
                &ChannelDispatchOptions::PUBLISH,
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(published, 2);

        let id = dispatcher.invoke_default(|channel: &mut FakeChannel| Ok(channel.id), &cancel).await.unwrap();
        assert_eq!(id, 2, "the default key has its own channel");
        assert_eq!(dispatcher.channel_count(), 2);
    }

    #[tokio::test]
    async fn test_recovers_after_connection_loss() {
        let broker = Broker::new();
        let dispatcher = SingleChannelDispatcher::new(CountingFactory::new(&broker));
        let cancel = CancellationToken::new();

        dispatcher.invoke(Publish("one"), &ChannelDispatchOptions::PUBLISH, &cancel).await.unwrap();
        broker.kill_channels();

        let replaced = dispatcher
            .invoke_action(
                |channel: &mut FakeChannel| channel.publish("replaced").map(drop),
                &ChannelDispatchOptions::PUBLISH,
                &cancel,
            )
            .await;
        assert!(replaced.is_ok(), "a dead channel is replaced before the command runs");

        let err = dispatcher
            .invoke_action(
                |_: &mut FakeChannel| Err(FakeError::connection("connection reset")),
                &ChannelDispatchOptions::PUBLISH,
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        let published =
            dispatcher.invoke(Publish("resubmitted"), &ChannelDispatchOptions::PUBLISH, &cancel).await.unwrap();
        assert_eq!(published, 1);
        assert_eq!(broker.opens(), 3);
        assert_eq!(dispatcher.channel_count(), 1);
    }

    #[tokio::test]
    async fn test_dispose_closes_channels_and_rejects_calls() {
        let broker = Broker::new();
        let factory = CountingFactory::new(&broker);
        let created = Arc::clone(&factory.created);
        let dispatcher = SingleChannelDispatcher::new(factory);
        let cancel = CancellationToken::new();

        dispatcher.invoke(Publish("a"), &ChannelDispatchOptions::DEFAULT, &cancel).await.unwrap();
        dispatcher.invoke(Publish("b"), &ChannelDispatchOptions::PUBLISH, &cancel).await.unwrap();

        dispatcher.dispose();
        dispatcher.dispose();

        assert!(dispatcher.is_disposed());
        assert_eq!(broker.closes(), 2);
        assert_eq!(dispatcher.channel_count(), 0);

        let err = dispatcher
            .invoke(Publish("c"), &ChannelDispatchOptions::PUBLISH_WITH_CONFIRMS, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_disposed());
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_default_factory_uses_config() {
        let broker = Broker::new();
        let factory = DefaultPersistentChannelFactory::new(FakeOpener::new(&broker), &Default::default());
        let channel = factory.create(&ChannelDispatchOptions::PUBLISH_WITH_CONFIRMS);

        assert_eq!(channel.name(), "PublishWithConfirms");
        assert!(channel.options().publisher_confirms);
        assert_eq!(channel.state(), ChannelState::Closed);

        channel.start(&CancellationToken::new()).await.unwrap();
        assert_eq!(broker.confirms(), vec![true]);
    }
}
