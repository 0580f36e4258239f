mod common;
use anyhow::{anyhow, Result};
use approx_eq::assert_approx_eq;
use cog_align::align::WordAligner;
use cog_align::cognate::{CognateIdentifier, ThresholdCognateIdentifier};
use cog_align::inference::{
    CognateIdentifierProcessor, EmSoundChangeInducer, SimpleWordPairGenerator,
    SoundCorrespondenceIdentifier,
};
use cog_align::pipeline::{
    MultiThreadedPipeline, Pipeline, PipelineEvent, PipelineStatus, Processor,
};
use cog_align::shared::{EmParameters, VarietyPair};
use cog_align::Project;
use common::*;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Default)]
struct Item {
    steps: Vec<usize>,
}

struct Step {
    id: usize,
    pause: Duration,
}

impl Processor<Item> for Step {
    fn process(&self, data: &mut Item) -> Result<()> {
        thread::sleep(self.pause);
        data.steps.push(self.id);
        Ok(())
    }
}

struct FailOn(usize);

impl Processor<Item> for FailOn {
    fn process(&self, data: &mut Item) -> Result<()> {
        if data.steps.len() == self.0 {
            return Err(anyhow!("bad item"));
        }
        Ok(())
    }
}

struct PanicOn(usize);

impl Processor<Item> for PanicOn {
    fn process(&self, data: &mut Item) -> Result<()> {
        if data.steps.len() == self.0 {
            panic!("item out of range");
        }
        Ok(())
    }
}

fn steps(k: usize, pause: Duration) -> Vec<Arc<dyn Processor<Item>>> {
    (0..k)
        .map(|id| Arc::new(Step { id, pause }) as Arc<dyn Processor<Item>>)
        .collect()
}

fn recorder() -> (Arc<Mutex<Vec<PipelineEvent>>>, impl FnMut(PipelineEvent) + Send + 'static) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    (events, move |e| sink.lock().unwrap().push(e))
}

#[test]
fn sequential_pipeline_runs_processors_in_order() -> Result<()> {
    let pipeline = Pipeline::new(steps(3, Duration::ZERO));
    let mut items: Vec<Item> = (0..4).map(|_| Item::default()).collect();
    pipeline.process(&mut items)?;
    assert!(items.iter().all(|i| i.steps == vec![0, 1, 2]));
    Ok(())
}

#[test]
fn countdown_reaches_zero() -> Result<()> {
    let pipeline = MultiThreadedPipeline::new(steps(3, Duration::from_millis(5)));
    let (events, handler) = recorder();
    let items: Vec<Item> = (0..5).map(|_| Item::default()).collect();
    let outcome = pipeline.process(items, handler).wait()?;

    assert_eq!(outcome.status, PipelineStatus::Completed);
    assert_eq!(outcome.remaining, 0);
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.items.len(), 5);
    assert!(outcome.items.iter().all(|i| i.steps == vec![0, 1, 2]));

    let events = events.lock().unwrap();
    let percents: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert!(percents.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(percents.last(), Some(&100));
    assert_eq!(
        events.last(),
        Some(&PipelineEvent::Completed(PipelineStatus::Completed))
    );
    Ok(())
}

#[test]
fn cancelled_pipeline_stops_between_processors() -> Result<()> {
    let pipeline = MultiThreadedPipeline::new(steps(3, Duration::from_millis(200)));
    let (events, handler) = recorder();
    let items: Vec<Item> = (0..5).map(|_| Item::default()).collect();
    let mut handle = pipeline.process(items, handler);
    handle.cancel();
    assert!(handle.is_cancelled());

    let outcome = handle
        .wait_for_complete(Duration::from_secs(30))
        .ok_or(anyhow!("pipeline did not stop"))?;
    assert!(outcome.is_cancelled());
    assert!(outcome.remaining > 0);
    // at most the processor running when the flag was set
    assert!(outcome.items.iter().all(|i| i.steps.len() <= 1));
    assert_eq!(
        events.lock().unwrap().last(),
        Some(&PipelineEvent::Completed(PipelineStatus::Cancelled))
    );
    Ok(())
}

#[test]
fn failing_processor_only_stops_its_item() -> Result<()> {
    let mut processors = steps(1, Duration::ZERO);
    processors.push(Arc::new(FailOn(1)));
    processors.extend(steps(1, Duration::ZERO));
    let pipeline = MultiThreadedPipeline::new(processors);
    let items: Vec<Item> = (0..3).map(|_| Item::default()).collect();
    let outcome = pipeline.process(items, |_| {}).wait()?;

    // every item has exactly one step when FailOn(1) runs
    assert_eq!(outcome.failures.len(), 3);
    assert!(outcome.failures.iter().all(|f| f.processor == 1));
    assert_eq!(outcome.remaining, 3 * 2);
    assert_eq!(outcome.status, PipelineStatus::Completed);
    Ok(())
}

#[test]
fn panicking_processor_is_reported_as_a_failure() -> Result<()> {
    let mut processors = steps(1, Duration::ZERO);
    processors.push(Arc::new(PanicOn(1)));
    processors.extend(steps(1, Duration::ZERO));
    let pipeline = MultiThreadedPipeline::new(processors);
    let items: Vec<Item> = (0..3).map(|_| Item::default()).collect();
    let (events, handler) = recorder();
    let outcome = pipeline.process(items, handler).wait()?;

    assert_eq!(outcome.items.len(), 3);
    assert!(outcome.items.iter().all(|i| i.steps == vec![0]));
    assert_eq!(outcome.failures.len(), 3);
    assert!(outcome.failures.iter().all(|f| f.processor == 1));
    assert!(outcome
        .failures
        .iter()
        .all(|f| f.error.to_string().contains("item out of range")));
    assert_eq!(outcome.remaining, 3 * 2);
    assert_eq!(
        events.lock().unwrap().last(),
        Some(&PipelineEvent::Completed(PipelineStatus::Completed))
    );
    Ok(())
}

#[test]
fn empty_batch_completes_immediately() -> Result<()> {
    let pipeline = MultiThreadedPipeline::new(steps(2, Duration::ZERO));
    let (events, handler) = recorder();
    let mut handle = pipeline.process(Vec::new(), handler);
    let outcome = handle
        .wait_for_complete(Duration::from_secs(10))
        .ok_or(anyhow!("pipeline did not finish"))?;
    assert!(outcome.items.is_empty());
    assert_eq!(outcome.remaining, 0);
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            PipelineEvent::Progress(100),
            PipelineEvent::Completed(PipelineStatus::Completed)
        ]
    );
    Ok(())
}

#[test]
fn variety_pairs_through_the_whole_chain() -> Result<()> {
    let pool = segment_pool();
    let mut project = Project::new();
    project.add_variety(variety(
        &pool,
        "v1",
        &[("one", "pata"), ("two", "kesi"), ("three", "mano")],
    )?);
    project.add_variety(variety(
        &pool,
        "v2",
        &[("one", "bata"), ("two", "gesi"), ("three", "mano")],
    )?);
    project.add_variety(variety(
        &pool,
        "v3",
        &[("one", "pate"), ("two", "kusi"), ("three", "tiko")],
    )?);
    project.add_aligner("aline", WordAligner::new(settings()?));
    project.add_cognate_identifier(
        "threshold",
        CognateIdentifier::Threshold(ThresholdCognateIdentifier::default()),
    );
    let project = Arc::new(project);

    let processors: Vec<Arc<dyn Processor<VarietyPair>>> = vec![
        Arc::new(SimpleWordPairGenerator::new(project.clone(), "aline", 0.7)),
        Arc::new(EmSoundChangeInducer::new(
            project.clone(),
            "aline",
            "threshold",
            EmParameters::default(),
        )),
        Arc::new(CognateIdentifierProcessor::new(project.clone(), "aline", "threshold")),
        Arc::new(SoundCorrespondenceIdentifier::new(project.clone(), "aline")),
    ];
    let outcome = MultiThreadedPipeline::new(processors)
        .process(project.variety_pairs(), |_| {})
        .wait()?;

    assert_eq!(outcome.remaining, 0);
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.items.len(), 3);
    for pair in &outcome.items {
        assert_eq!(pair.word_pairs.len(), 3);
        assert!(pair.sound_change_probability_distribution.is_some());
        assert!(pair.lexical_similarity_score.is_some());
    }
    let v1_v2 = &outcome.items[0];
    assert_eq!(v1_v2.variety2.name(), "v2");
    assert_approx_eq!(v1_v2.lexical_similarity_score.unwrap(), 1.);
    Ok(())
}
