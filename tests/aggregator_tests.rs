// Integration tests for the emotion sample aggregator
//
// These tests verify the sampling policies, the last-known-good behaviour on
// classifier failure, summaries, the terminal Ended state, and consistency
// under concurrent observe/summarize.

mod common;

use anyhow::Result;
use common::{frame, GatedClassifier, ScriptedClassifier};
use neuronote::{
    AggregatorState, ClassificationError, ClassificationResult, Emotion, EmotionAggregator,
    EmotionLabel, EmotionSummary, SamplingPolicy, SessionError,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn aggregator(policy: SamplingPolicy, classifier: Arc<ScriptedClassifier>) -> EmotionAggregator {
    EmotionAggregator::new(policy, None, classifier)
}

#[tokio::test]
async fn test_stride_policy_invokes_classifier_floor_n_over_k() -> Result<()> {
    for stride in 1..=4u64 {
        for frames in [0u64, 1, 5, 12, 13] {
            let classifier = Arc::new(ScriptedClassifier::always(Emotion::Happy));
            let agg = aggregator(SamplingPolicy::stride(stride)?, classifier.clone());
            let start = Instant::now();

            let mut sampled = 0;
            for i in 0..frames {
                let obs = agg.observe(&frame(i), start + Duration::from_millis(i * 33)).await?;
                if obs.sampled {
                    sampled += 1;
                }
            }

            assert_eq!(
                classifier.calls() as u64,
                frames / stride,
                "stride {} over {} frames",
                stride,
                frames
            );
            assert_eq!(sampled, frames / stride);
            assert_eq!(agg.history().len() as u64, frames / stride);
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_stride_policy_samples_on_kth_frame() -> Result<()> {
    let classifier = Arc::new(ScriptedClassifier::labels(&[Emotion::Sad]));
    let agg = aggregator(SamplingPolicy::stride(3)?, classifier.clone());
    let now = Instant::now();

    let first = agg.observe(&frame(0), now).await?;
    let second = agg.observe(&frame(1), now).await?;
    let third = agg.observe(&frame(2), now).await?;

    assert!(!first.sampled);
    assert_eq!(first.label, EmotionLabel::Pending);
    assert!(!second.sampled);
    assert!(third.sampled);
    assert_eq!(third.label, EmotionLabel::Detected(Emotion::Sad));

    Ok(())
}

#[tokio::test]
async fn test_interval_policy_throttles_within_interval() -> Result<()> {
    let classifier = Arc::new(ScriptedClassifier::labels(&[Emotion::Happy, Emotion::Angry]));
    let agg = aggregator(SamplingPolicy::interval(Duration::from_millis(2000)), classifier.clone());
    let start = Instant::now();

    let first = agg.observe(&frame(0), start).await?;
    assert!(first.sampled, "First frame should always be sampled");
    assert_eq!(first.label, EmotionLabel::Detected(Emotion::Happy));

    for ms in [1u64, 500, 1000, 1999] {
        let obs = agg.observe(&frame(ms), start + Duration::from_millis(ms)).await?;
        assert!(!obs.sampled, "Frame at {}ms should be throttled", ms);
        assert_eq!(obs.label, EmotionLabel::Detected(Emotion::Happy));
    }

    assert_eq!(classifier.calls(), 1, "Throttled frames must not reach the classifier");
    assert_eq!(agg.state(), AggregatorState::Idle);

    // Exactly one interval later is due again
    let due = agg.observe(&frame(2000), start + Duration::from_millis(2000)).await?;
    assert!(due.sampled);
    assert_eq!(due.label, EmotionLabel::Detected(Emotion::Angry));
    assert_eq!(agg.state(), AggregatorState::Sampling);
    assert_eq!(agg.history(), vec![Emotion::Happy, Emotion::Angry]);

    Ok(())
}

#[tokio::test]
async fn test_hybrid_policy_requires_stride_and_interval() -> Result<()> {
    let classifier = Arc::new(ScriptedClassifier::always(Emotion::Neutral));
    let agg = aggregator(
        SamplingPolicy::hybrid(2, Duration::from_millis(1000))?,
        classifier.clone(),
    );
    let start = Instant::now();

    // Frame 1: stride not due
    assert!(!agg.observe(&frame(0), start).await?.sampled);
    // Frame 2: stride due, no previous sample
    assert!(agg.observe(&frame(1), start).await?.sampled);
    // Frame 3: stride not due; frame 4: stride due, interval not elapsed
    assert!(!agg.observe(&frame(2), start + Duration::from_millis(300)).await?.sampled);
    assert!(!agg.observe(&frame(3), start + Duration::from_millis(600)).await?.sampled);
    // Frame 5: interval elapsed, stride not due
    assert!(!agg.observe(&frame(4), start + Duration::from_millis(1100)).await?.sampled);
    // Frame 6: both due
    assert!(agg.observe(&frame(5), start + Duration::from_millis(1200)).await?.sampled);

    assert_eq!(classifier.calls(), 2);

    Ok(())
}

#[tokio::test]
async fn test_label_is_pending_before_first_classification() -> Result<()> {
    let classifier = Arc::new(ScriptedClassifier::always(Emotion::Happy));
    let agg = aggregator(SamplingPolicy::stride(5)?, classifier);

    assert_eq!(agg.state(), AggregatorState::Uninitialized);
    assert_eq!(agg.last_label(), EmotionLabel::Pending);
    assert_eq!(agg.last_label().to_string(), "Detecting...");

    let obs = agg.observe(&frame(0), Instant::now()).await?;
    assert_eq!(obs.label, EmotionLabel::Pending);
    assert_eq!(agg.state(), AggregatorState::Idle);

    Ok(())
}

#[tokio::test]
async fn test_classifier_failure_keeps_last_known_good() -> Result<()> {
    let classifier = Arc::new(ScriptedClassifier::new(
        vec![
            Ok(ClassificationResult::new(Emotion::Surprised)),
            Err(ClassificationError::NoFace),
            Err(ClassificationError::Internal {
                message: "worker crashed".to_string(),
            }),
            Ok(ClassificationResult::new(Emotion::Happy)),
        ],
        Emotion::Neutral,
    ));
    let agg = aggregator(SamplingPolicy::interval(Duration::from_millis(2000)), classifier.clone());
    let start = Instant::now();

    let first = agg.observe(&frame(0), start).await?;
    assert_eq!(first.label, EmotionLabel::Detected(Emotion::Surprised));
    let history_before = agg.history().len();
    let sampled_at = agg.snapshot().last_sample_at;

    let failed = agg.observe(&frame(1), start + Duration::from_millis(2500)).await?;
    assert!(!failed.sampled);
    assert_eq!(failed.label, first.label, "Failure should return the previous label");
    assert_eq!(agg.history().len(), history_before, "Failure must not touch history");
    assert_eq!(agg.snapshot().last_sample_at, sampled_at);
    assert_eq!(agg.state(), AggregatorState::Idle);

    // Timestamp was not advanced, so the very next frame retries
    let failed_again = agg.observe(&frame(2), start + Duration::from_millis(2600)).await?;
    assert!(!failed_again.sampled);
    assert_eq!(classifier.calls(), 3);

    let recovered = agg.observe(&frame(3), start + Duration::from_millis(2700)).await?;
    assert!(recovered.sampled);
    assert_eq!(recovered.label, EmotionLabel::Detected(Emotion::Happy));
    assert_eq!(agg.snapshot().classifier_failures, 2);
    assert_eq!(agg.history(), vec![Emotion::Surprised, Emotion::Happy]);

    Ok(())
}

#[tokio::test]
async fn test_failure_before_first_success_stays_pending() -> Result<()> {
    let classifier = Arc::new(ScriptedClassifier::new(
        vec![Err(ClassificationError::InvalidInput {
            reason: "empty payload".to_string(),
        })],
        Emotion::Happy,
    ));
    let agg = aggregator(SamplingPolicy::stride(1)?, classifier);

    let obs = agg.observe(&frame(0), Instant::now()).await?;
    assert!(!obs.sampled);
    assert_eq!(obs.label, EmotionLabel::Pending);
    assert!(agg.summarize().is_no_data());

    Ok(())
}

#[tokio::test]
async fn test_summary_of_three_to_one() -> Result<()> {
    let classifier = Arc::new(ScriptedClassifier::labels(&[
        Emotion::Happy,
        Emotion::Happy,
        Emotion::Happy,
        Emotion::Sad,
    ]));
    let agg = aggregator(SamplingPolicy::stride(1)?, classifier);
    let now = Instant::now();

    for i in 0..4 {
        agg.observe(&frame(i), now).await?;
    }

    let summary = agg.summarize();
    assert_eq!(summary.percentage(Emotion::Happy), Some(75));
    assert_eq!(summary.percentage(Emotion::Sad), Some(25));
    assert_eq!(summary.percentage(Emotion::Angry), None, "Unobserved labels are absent");
    assert_eq!(summary.dominant(), Some(Emotion::Happy));

    // Reading the summary does not clear history
    assert_eq!(agg.history().len(), 4);
    assert_eq!(agg.summarize(), summary);

    Ok(())
}

#[tokio::test]
async fn test_summary_without_samples_is_no_data() -> Result<()> {
    let classifier = Arc::new(ScriptedClassifier::always(Emotion::Happy));
    let agg = aggregator(SamplingPolicy::stride(10)?, classifier);

    agg.observe(&frame(0), Instant::now()).await?;

    let summary = agg.summarize();
    assert_eq!(summary, EmotionSummary::NoData);
    assert_ne!(summary, EmotionSummary::Distribution(Default::default()));
    assert_eq!(summary.to_string(), "No emotions detected");

    let json = serde_json::to_value(&summary)?;
    assert_eq!(json["status"], "no_data");

    Ok(())
}

#[test]
fn test_summary_rounding_drift_is_preserved() {
    let three_way = EmotionSummary::from_history(&[Emotion::Happy, Emotion::Sad, Emotion::Angry]);
    let total: u32 = Emotion::ALL.iter().filter_map(|e| three_way.percentage(*e)).sum();
    assert_eq!(total, 99, "Independent rounding may not sum to 100");

    // Halves round to even: 1/8 = 12.5 -> 12, 3/8 = 37.5 -> 38
    let mut eighths = vec![Emotion::Sad];
    eighths.extend([Emotion::Happy; 3]);
    eighths.extend([Emotion::Neutral; 4]);
    let summary = EmotionSummary::from_history(&eighths);
    assert_eq!(summary.percentage(Emotion::Sad), Some(12));
    assert_eq!(summary.percentage(Emotion::Happy), Some(38));
    assert_eq!(summary.percentage(Emotion::Neutral), Some(50));
}

#[tokio::test]
async fn test_history_limit_evicts_oldest() -> Result<()> {
    let classifier = Arc::new(ScriptedClassifier::labels(&[
        Emotion::Angry,
        Emotion::Happy,
        Emotion::Happy,
        Emotion::Sad,
    ]));
    let agg = EmotionAggregator::new(SamplingPolicy::stride(1)?, Some(3), classifier);
    let now = Instant::now();

    for i in 0..4 {
        agg.observe(&frame(i), now).await?;
    }

    assert_eq!(agg.history(), vec![Emotion::Happy, Emotion::Happy, Emotion::Sad]);
    assert_eq!(agg.snapshot().samples_recorded, 4);
    assert_eq!(agg.summarize().percentage(Emotion::Angry), None);

    Ok(())
}

#[tokio::test]
async fn test_observe_after_end_is_rejected_without_mutation() -> Result<()> {
    let classifier = Arc::new(ScriptedClassifier::always(Emotion::Fearful));
    let agg = aggregator(SamplingPolicy::stride(1)?, classifier.clone());
    let start = Instant::now();

    agg.observe(&frame(0), start).await?;
    let before = agg.snapshot();

    assert!(agg.end());
    assert!(!agg.end(), "Ending twice reports the session was already ended");

    for i in 1..5 {
        let result = agg.observe(&frame(i), start + Duration::from_secs(i * 10)).await;
        assert_eq!(result, Err(SessionError::Ended));
    }

    let after = agg.snapshot();
    assert_eq!(after.state, AggregatorState::Ended);
    assert_eq!(after.frame_counter, before.frame_counter);
    assert_eq!(after.history_len, before.history_len);
    assert_eq!(after.last_sample_at, before.last_sample_at);
    assert_eq!(classifier.calls(), 1);

    // History stays readable after the end
    assert_eq!(agg.summarize().percentage(Emotion::Fearful), Some(100));

    Ok(())
}

#[tokio::test]
async fn test_frames_during_inflight_classification_are_throttled() -> Result<()> {
    let classifier = Arc::new(GatedClassifier::new(Emotion::Happy));
    let agg = Arc::new(EmotionAggregator::new(
        SamplingPolicy::stride(1)?,
        None,
        classifier.clone(),
    ));
    let now = Instant::now();

    let pending = {
        let agg = Arc::clone(&agg);
        tokio::spawn(async move { agg.observe(&frame(0), now).await })
    };
    classifier.wait_for_calls(1).await;

    let overlapping = agg.observe(&frame(1), now).await?;
    assert!(!overlapping.sampled);
    assert_eq!(overlapping.label, EmotionLabel::Pending);
    assert_eq!(classifier.calls(), 1, "No second call while one is in flight");

    classifier.release(1);
    let first = pending.await??;
    assert!(first.sampled);
    assert_eq!(agg.history(), vec![Emotion::Happy]);

    Ok(())
}

#[tokio::test]
async fn test_cancelled_classification_does_not_block_sampling() -> Result<()> {
    let classifier = Arc::new(GatedClassifier::new(Emotion::Sad));
    let agg = EmotionAggregator::new(SamplingPolicy::stride(1)?, None, classifier.clone());
    let now = Instant::now();

    // Caller gives up while the classifier is still blocked
    let cancelled = tokio::time::timeout(Duration::from_millis(20), agg.observe(&frame(0), now)).await;
    assert!(cancelled.is_err());
    assert_eq!(classifier.calls(), 1);

    classifier.release(10);
    for i in 1..=3 {
        let observation = agg.observe(&frame(i * 33), now).await?;
        assert!(observation.sampled, "frame {} should be sampled", i);
    }

    assert_eq!(classifier.calls(), 4);
    assert_eq!(agg.history(), vec![Emotion::Sad; 3]);
    assert_eq!(agg.last_label(), EmotionLabel::Detected(Emotion::Sad));

    Ok(())
}

#[tokio::test]
async fn test_classification_finishing_after_end_is_discarded() -> Result<()> {
    let classifier = Arc::new(GatedClassifier::new(Emotion::Happy));
    let agg = Arc::new(EmotionAggregator::new(
        SamplingPolicy::stride(1)?,
        None,
        classifier.clone(),
    ));

    let pending = {
        let agg = Arc::clone(&agg);
        tokio::spawn(async move { agg.observe(&frame(0), Instant::now()).await })
    };
    classifier.wait_for_calls(1).await;

    agg.end();
    classifier.release(1);

    assert_eq!(pending.await?, Err(SessionError::Ended));
    assert!(agg.history().is_empty());
    assert_eq!(agg.last_label(), EmotionLabel::Pending);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_observe_and_summarize_stay_consistent() -> Result<()> {
    let classifier = Arc::new(ScriptedClassifier::always(Emotion::Happy));
    let agg = Arc::new(EmotionAggregator::new(
        SamplingPolicy::stride(1)?,
        None,
        classifier.clone(),
    ));
    let start = Instant::now();

    let mut producers = Vec::new();
    for p in 0..4u64 {
        let agg = Arc::clone(&agg);
        producers.push(tokio::spawn(async move {
            for i in 0..250u64 {
                agg.observe(&frame(p * 1000 + i), start).await?;
            }
            Ok::<_, SessionError>(())
        }));
    }

    let reader = {
        let agg = Arc::clone(&agg);
        tokio::spawn(async move {
            let mut reads = 0;
            for _ in 0..500 {
                match agg.summarize() {
                    EmotionSummary::NoData => {}
                    EmotionSummary::Distribution(map) => {
                        assert_eq!(map.len(), 1, "Only one label is ever produced");
                        assert_eq!(map.get(&Emotion::Happy), Some(&100));
                    }
                }
                let snapshot = agg.snapshot();
                assert_eq!(snapshot.history_len as u64, snapshot.samples_recorded);
                reads += 1;
                tokio::task::yield_now().await;
            }
            reads
        })
    };

    for producer in producers {
        producer.await??;
    }
    assert_eq!(reader.await?, 500);

    let snapshot = agg.snapshot();
    assert_eq!(snapshot.frame_counter, 1000);
    assert_eq!(
        snapshot.history_len,
        classifier.calls(),
        "Every classifier call is recorded exactly once"
    );
    assert!(snapshot.history_len >= 1);

    Ok(())
}
