#[cfg(test)]
mod tests {
    use crate::{ScriptedSource, Step};
    use engine_config::settings::ScrollSettings;
    use engine_core::{
        connectors::{memory::MemorySource, retrying::RetryingSource},
        error::SourceError,
        retry::RetryPolicy,
    };
    use engine_runtime::{error::ScrollError, scroll::ScrollPublisher};
    use futures::{StreamExt, TryStreamExt, stream::FusedStream};
    use model::query::ScrollQuery;
    use std::{sync::Arc, time::Duration};

    fn settings(prefetch: u64) -> ScrollSettings {
        ScrollSettings::builder().prefetch(prefetch).build().unwrap()
    }

    #[tokio::test]
    async fn collects_every_item_in_order() {
        let items: Vec<u32> = (0..250).collect();
        let publisher =
            ScrollPublisher::new(MemorySource::from_items(items.clone(), 7), settings(16));

        let stream = publisher.stream(ScrollQuery::new("orders")).await.unwrap();
        let metrics = stream.metrics();
        assert_eq!(metrics.items_emitted, 0);

        let collected: Vec<u32> = stream.try_collect().await.unwrap();
        assert_eq!(collected, items);
        // 36 pages of data plus the empty page that ends the scroll.
        assert_eq!(publisher.source().calls(), 37);
    }

    #[tokio::test]
    async fn concurrent_streams_on_one_publisher_are_independent() {
        let publisher =
            ScrollPublisher::new(MemorySource::from_items((0..6u32).collect(), 2), settings(1));

        let a = publisher.stream(ScrollQuery::new("orders")).await.unwrap();
        let b = publisher.stream(ScrollQuery::new("orders")).await.unwrap();
        let (a, b): (Result<Vec<u32>, _>, Result<Vec<u32>, _>) =
            tokio::join!(a.try_collect(), b.try_collect());

        assert_eq!(a.unwrap(), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(b.unwrap(), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(publisher.source().calls(), 8);
    }

    #[tokio::test]
    async fn prefetch_of_one_still_drains_the_scroll() {
        let publisher =
            ScrollPublisher::new(MemorySource::from_items((0..20u32).collect(), 3), settings(1));

        let mut stream = publisher.stream(ScrollQuery::new("orders")).await.unwrap();
        let mut seen = Vec::new();
        while let Some(item) = stream.next().await {
            seen.push(item.unwrap());
        }

        assert_eq!(seen, (0..20u32).collect::<Vec<_>>());
        let metrics = stream.metrics();
        assert_eq!(metrics.items_emitted, 20);
        assert_eq!(metrics.batches_fetched, 8);
    }

    #[tokio::test]
    async fn item_limit_truncates_the_stream() {
        let settings = ScrollSettings::builder()
            .max_items(10)
            .prefetch(4)
            .build()
            .unwrap();
        let publisher = ScrollPublisher::new(MemorySource::from_items((0..100u32).collect(), 6), settings);

        let collected: Vec<u32> = publisher
            .stream(ScrollQuery::new("orders"))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(collected, (0..10u32).collect::<Vec<_>>());
        assert_eq!(publisher.source().calls(), 2);
    }

    #[tokio::test]
    async fn error_is_the_last_element() {
        let source = ScriptedSource::new(vec![
            Step::Page(vec![1, 2]),
            Step::Fail(SourceError::Rejected("search_context_missing_exception".into())),
            Step::Page(vec![3]),
        ]);
        let publisher = ScrollPublisher::new(source, settings(8));

        let results: Vec<Result<u32, ScrollError>> = publisher
            .stream(ScrollQuery::new("orders"))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), &1);
        assert_eq!(results[1].as_ref().unwrap(), &2);
        match &results[2] {
            Err(ScrollError::Fetch { page, source }) => {
                assert_eq!(*page, 2);
                assert!(matches!(source, SourceError::Rejected(_)));
            }
            other => panic!("expected a fetch failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ended_stream_keeps_returning_none() {
        let publisher = ScrollPublisher::new(MemorySource::from_items(vec![1u32, 2], 2), settings(4));
        let mut stream = publisher.stream(ScrollQuery::new("orders")).await.unwrap();

        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert_eq!(stream.next().await.unwrap().unwrap(), 2);
        assert!(!stream.is_terminated());
        assert!(stream.next().await.is_none());
        assert!(stream.is_terminated());
        assert!(stream.next().await.is_none());

        let failing = ScrollPublisher::new(
            ScriptedSource::<u32>::new(vec![Step::Fail(SourceError::Rejected("bad".into()))]),
            settings(4),
        );
        let mut stream = failing.stream(ScrollQuery::new("orders")).await.unwrap();
        assert!(matches!(stream.next().await, Some(Err(ScrollError::Start(_)))));
        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn retrying_source_hides_transient_failures() {
        let scripted = Arc::new(ScriptedSource::new(vec![
            Step::Page(vec![1]),
            Step::Fail(SourceError::Unavailable("node restarting".into())),
            Step::Page(vec![2]),
        ]));
        let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(1));
        let publisher = ScrollPublisher::new(RetryingSource::new(scripted.clone(), policy), settings(8));

        let collected: Vec<u32> = publisher
            .stream(ScrollQuery::new("orders"))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(collected, vec![1, 2]);
        assert_eq!(
            scripted.fetched_cursors(),
            vec!["cursor0", "cursor0", "cursor2"]
        );
    }

    #[tokio::test]
    async fn dropping_the_stream_stops_fetching() {
        let pages = (0..50u32).map(|p| vec![p * 2, p * 2 + 1]).collect();
        let source = Arc::new(ScriptedSource::pages(pages));
        let publisher = ScrollPublisher::from_arc(source.clone(), settings(2));

        let first: Vec<u32> = publisher
            .stream(ScrollQuery::new("orders"))
            .await
            .unwrap()
            .take(3)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(first, vec![0, 1, 2]);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let calls = source.calls().len();
        assert!(calls <= 4, "fetched {calls} pages for 3 items");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls().len(), calls);
    }
}
