//! Generation stage trait and pipeline orchestration.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::biomes::{
    expected_pass_count, BiomeComposer, CompositionConfig, CompositionProgress, PassSummary,
};
use crate::error::GenerationError;
use crate::export::{ChunkSink, ExportError};
use crate::noise::{apply_detail, DetailNoiseConfig};
use crate::random::{cell_rng, stream_rng, Stream};
use crate::terrain::{ChunkConfig, ChunkTessellator, Surface};

/// Unique identifier for generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Coarse biome map composition.
    Composition,
    /// Chunk materialization, detail noise and persistence.
    Chunks,
}

impl StageId {
    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Composition => "composition",
            StageId::Chunks => "chunks",
        }
    }
}

/// Configuration passed to each generation stage.
#[derive(Debug, Clone, Default)]
pub struct StageConfig {
    /// Master seed every stage derives its random streams from.
    pub seed: u64,
}

impl StageConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

/// Shared progress sink; receives the stage's completed fraction, 0.0 to 1.0.
pub type ProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

/// Errors that can occur during pipeline execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage '{0}' failed: {1}")]
    StageFailed(String, String),
    #[error("Missing dependency: stage '{0}' requires '{1}'")]
    MissingDependency(String, String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Artifacts produced by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct World {
    /// Finished coarse biome map (populated by the composition stage).
    pub biome_map: Option<Surface>,
    /// Per-pass statistics of the composition.
    pub passes: Vec<PassSummary>,
    /// Number of chunks handed to the sink.
    pub chunks_written: usize,
}

/// Trait for implementing generation stages.
///
/// Each stage reads what earlier stages left in the [`World`] and adds its
/// own artifacts.
pub trait GenerationStage: Send + Sync {
    /// Returns the unique identifier for this stage.
    fn id(&self) -> StageId;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str;

    /// Returns the stage IDs that must be executed before this stage.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    /// Checks the stage's configuration. The pipeline validates every stage
    /// before executing any of them.
    fn validate(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    /// Executes the generation stage, modifying the world in place.
    fn execute(&self, world: &mut World, config: &StageConfig) -> Result<(), PipelineError>;

    /// Optional progress callback for long-running stages.
    ///
    /// # Arguments
    /// * `progress` - Value from 0.0 to 1.0 indicating completion
    fn on_progress(&self, _progress: f32) {}
}

/// Orchestrates multiple generation stages into a complete pipeline.
pub struct Pipeline {
    stages: Vec<Box<dyn GenerationStage>>,
    config: StageConfig,
}

impl Pipeline {
    /// Creates a new empty pipeline with the given configuration.
    pub fn new(config: StageConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: GenerationStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Returns the number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Executes all stages in order.
    pub fn run(&self, world: &mut World) -> Result<(), PipelineError> {
        self.run_with_callbacks(world, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all stages with progress callbacks.
    ///
    /// Every stage is validated first, so a bad configuration fails before
    /// any stage runs.
    ///
    /// # Arguments
    /// * `world` - The world to generate into
    /// * `on_stage_start` - Called when each stage begins
    /// * `on_stage_complete` - Called when each stage finishes
    pub fn run_with_callbacks<F1, F2>(
        &self,
        world: &mut World,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<(), PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        for stage in &self.stages {
            stage.validate()?;
        }

        let total = self.stages.len();
        let mut completed: Vec<StageId> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            on_stage_start(stage.name(), i, total);

            for dep in stage.dependencies() {
                if !completed.contains(dep) {
                    return Err(PipelineError::MissingDependency(
                        stage.name().to_string(),
                        dep.name().to_string(),
                    ));
                }
            }

            stage.execute(world, &self.config)?;
            completed.push(stage.id());

            on_stage_complete(stage.name(), i, total);
        }

        Ok(())
    }
}

/// Builds the coarse biome map.
pub struct CompositionStage {
    config: CompositionConfig,
    progress: Option<ProgressFn>,
}

impl CompositionStage {
    pub fn new(config: CompositionConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Reports progress over all passes, updated after every column.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl GenerationStage for CompositionStage {
    fn id(&self) -> StageId {
        StageId::Composition
    }

    fn name(&self) -> &str {
        "Biome Composition"
    }

    fn validate(&self) -> Result<(), PipelineError> {
        Ok(self.config.validate()?)
    }

    fn execute(&self, world: &mut World, config: &StageConfig) -> Result<(), PipelineError> {
        let rng = stream_rng(config.seed, Stream::Composition);
        let expected = expected_pass_count(
            self.config.depth,
            self.config.min_depth,
            self.config.max_refinements,
        ) as f32;
        let map = BiomeComposer::new(self.config.clone(), rng)?.run_with_progress(|event| {
            let done = match event {
                CompositionProgress::Column { pass, fraction } => pass as f32 + fraction,
                CompositionProgress::Pass(summary) => (summary.index + 1) as f32,
            };
            self.on_progress((done / expected).min(1.0));
        })?;

        info!(
            width = map.surface.width(),
            height = map.surface.height(),
            passes = map.passes.len(),
            "biome map composed"
        );
        world.biome_map = Some(map.surface);
        world.passes = map.passes;
        Ok(())
    }

    fn on_progress(&self, progress: f32) {
        if let Some(report) = &self.progress {
            report(progress);
        }
    }
}

/// Which coarse cells the chunk stage materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSelection {
    /// Every coarse cell.
    All,
    /// A rectangle of coarse cells, clipped to the map.
    Region {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

impl ChunkSelection {
    /// Selected coordinates on a `width × height` map, row by row.
    pub fn coordinates(&self, width: u32, height: u32) -> Vec<(u32, u32)> {
        let (x0, y0, x1, y1) = match *self {
            ChunkSelection::All => (0, 0, width, height),
            ChunkSelection::Region {
                x,
                y,
                width: w,
                height: h,
            } => (
                x.min(width),
                y.min(height),
                x.saturating_add(w).min(width),
                y.saturating_add(h).min(height),
            ),
        };
        (y0..y1)
            .flat_map(|y| (x0..x1).map(move |x| (x, y)))
            .collect()
    }
}

/// Materializes, details and persists chunks in parallel.
///
/// Each chunk draws its detail basis from its own stream derived from the
/// master seed and its coordinate, so output does not depend on scheduling.
pub struct ChunkStage {
    chunks: ChunkConfig,
    detail: DetailNoiseConfig,
    selection: ChunkSelection,
    sink: Arc<dyn ChunkSink>,
    progress: Option<ProgressFn>,
}

impl ChunkStage {
    pub fn new(
        chunks: ChunkConfig,
        detail: DetailNoiseConfig,
        selection: ChunkSelection,
        sink: Arc<dyn ChunkSink>,
    ) -> Self {
        Self {
            chunks,
            detail,
            selection,
            sink,
            progress: None,
        }
    }

    /// Reports the fraction of selected chunks written, from worker threads.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl GenerationStage for ChunkStage {
    fn id(&self) -> StageId {
        StageId::Chunks
    }

    fn name(&self) -> &str {
        "Chunk Generation"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Composition]
    }

    fn validate(&self) -> Result<(), PipelineError> {
        self.chunks.validate()?;
        Ok(self.detail.validate(self.chunks.size)?)
    }

    fn execute(&self, world: &mut World, config: &StageConfig) -> Result<(), PipelineError> {
        let map = world.biome_map.as_ref().ok_or_else(|| {
            PipelineError::StageFailed(self.name().to_string(), "no biome map available".to_string())
        })?;
        let tessellator = ChunkTessellator::new(map, self.chunks.clone(), config.seed)?;

        let coords = self.selection.coordinates(map.width(), map.height());
        if coords.is_empty() {
            warn!(selection = ?self.selection, "chunk selection is empty");
            return Ok(());
        }
        info!(
            chunks = coords.len(),
            size = self.chunks.size,
            octaves = self.detail.octaves,
            "generating chunks"
        );

        let total = coords.len();
        let done = AtomicUsize::new(0);
        coords
            .par_iter()
            .try_for_each(|&(cx, cy)| -> Result<(), PipelineError> {
                let mut chunk = tessellator.materialize(cx, cy)?;
                let mut rng = cell_rng(config.seed, Stream::ChunkDetail, cx, cy);
                apply_detail(&mut chunk, &self.detail, &mut rng)?;
                self.sink.write_chunk(&chunk)?;

                let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(x = cx, y = cy, "chunk written");
                self.on_progress(n as f32 / total as f32);
                Ok(())
            })?;

        world.chunks_written += total;
        info!(chunks = total, "chunks written");
        Ok(())
    }

    fn on_progress(&self, progress: f32) {
        if let Some(report) = &self.progress {
            report(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{Chunk, ChunkSeeding};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink {
        chunks: Mutex<Vec<Chunk>>,
    }

    impl ChunkSink for CollectingSink {
        fn write_chunk(&self, chunk: &Chunk) -> Result<(), ExportError> {
            self.chunks.lock().unwrap().push(chunk.clone());
            Ok(())
        }
    }

    impl CollectingSink {
        fn sorted(&self) -> Vec<Chunk> {
            let mut chunks = self.chunks.lock().unwrap().clone();
            chunks.sort_by_key(|c| (c.y, c.x));
            chunks
        }
    }

    fn small_chunks() -> ChunkConfig {
        ChunkConfig {
            size: 8,
            seeding: ChunkSeeding::Jittered,
        }
    }

    fn detail() -> DetailNoiseConfig {
        DetailNoiseConfig {
            octaves: 3,
            persistence: 0.6,
        }
    }

    fn chunk_pipeline(seed: u64, selection: ChunkSelection, sink: Arc<CollectingSink>) -> Pipeline {
        let mut pipeline = Pipeline::new(StageConfig::with_seed(seed));
        pipeline.add_stage(CompositionStage::new(CompositionConfig::fine(8)));
        pipeline.add_stage(ChunkStage::new(small_chunks(), detail(), selection, sink));
        pipeline
    }

    #[test]
    fn test_stage_id_name() {
        assert_eq!(StageId::Composition.name(), "composition");
        assert_eq!(StageId::Chunks.name(), "chunks");
    }

    #[test]
    fn test_composition_stage_fills_the_world() {
        let mut pipeline = Pipeline::new(StageConfig::with_seed(42));
        pipeline.add_stage(CompositionStage::new(CompositionConfig::fine(16)));

        let mut world = World::default();
        pipeline.run(&mut world).unwrap();

        let map = world.biome_map.unwrap();
        assert_eq!((map.width(), map.height()), (33, 33));
        assert_eq!(world.passes.len(), 3);
    }

    #[test]
    fn test_chunk_stage_requires_composition() {
        let mut pipeline = Pipeline::new(StageConfig::default());
        pipeline.add_stage(ChunkStage::new(
            small_chunks(),
            detail(),
            ChunkSelection::All,
            Arc::new(CollectingSink::default()),
        ));

        let err = pipeline.run(&mut World::default()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingDependency(_, _)));
    }

    #[test]
    fn test_region_selection_is_clipped() {
        let region = ChunkSelection::Region {
            x: 15,
            y: 0,
            width: 5,
            height: 2,
        };
        assert_eq!(region.coordinates(17, 17), vec![(15, 0), (16, 0), (15, 1), (16, 1)]);
        assert_eq!(ChunkSelection::All.coordinates(2, 2).len(), 4);
        let outside = ChunkSelection::Region {
            x: 40,
            y: 40,
            width: 3,
            height: 3,
        };
        assert!(outside.coordinates(17, 17).is_empty());
    }

    #[test]
    fn test_chunk_stage_writes_every_selected_chunk() {
        let sink = Arc::new(CollectingSink::default());
        let pipeline = chunk_pipeline(7, ChunkSelection::All, sink.clone());

        let mut world = World::default();
        pipeline.run(&mut world).unwrap();

        assert_eq!(world.chunks_written, 17 * 17);
        let chunks = sink.sorted();
        assert_eq!(chunks.len(), 17 * 17);
        for chunk in &chunks {
            assert_eq!(chunk.size(), 8);
            let (min, max) = chunk.surface.value_range();
            assert!(min >= 0.0 && max <= 1.0);
        }
    }

    #[test]
    fn test_parallel_output_is_deterministic() {
        let region = ChunkSelection::Region {
            x: 4,
            y: 4,
            width: 6,
            height: 6,
        };
        let first = Arc::new(CollectingSink::default());
        let second = Arc::new(CollectingSink::default());
        let mut world = World::default();
        chunk_pipeline(99, region, first.clone()).run(&mut world).unwrap();
        chunk_pipeline(99, region, second.clone()).run(&mut World::default()).unwrap();

        let chunks = first.sorted();
        assert_eq!(chunks, second.sorted());

        // A chunk rebuilt on its own matches the one produced in parallel.
        let map = world.biome_map.as_ref().unwrap();
        let tess = ChunkTessellator::new(map, small_chunks(), 99).unwrap();
        let mut alone = tess.materialize(5, 6).unwrap();
        apply_detail(&mut alone, &detail(), &mut cell_rng(99, Stream::ChunkDetail, 5, 6)).unwrap();
        let produced = chunks.iter().find(|c| (c.x, c.y) == (5, 6)).unwrap();
        assert_eq!(produced, &alone);
    }

    #[test]
    fn test_invalid_stage_fails_before_composition_runs() {
        let mut pipeline = Pipeline::new(StageConfig::with_seed(1));
        pipeline.add_stage(CompositionStage::new(CompositionConfig::fine(64)));
        pipeline.add_stage(ChunkStage::new(
            small_chunks(),
            DetailNoiseConfig {
                octaves: 0,
                persistence: 0.6,
            },
            ChunkSelection::All,
            Arc::new(CollectingSink::default()),
        ));

        let mut world = World::default();
        let mut started = Vec::new();
        let err = pipeline
            .run_with_callbacks(&mut world, |name, _, _| started.push(name.to_string()), |_, _, _| {})
            .unwrap_err();

        assert!(matches!(err, PipelineError::Generation(GenerationError::Configuration(_))));
        assert!(started.is_empty());
        assert!(world.biome_map.is_none());
        assert!(world.passes.is_empty());

        let mut bad_map = Pipeline::new(StageConfig::default());
        bad_map.add_stage(CompositionStage::new(CompositionConfig {
            min_depth: 0,
            ..CompositionConfig::fine(8)
        }));
        assert!(bad_map.run(&mut World::default()).is_err());
    }

    #[test]
    fn test_stage_progress_reaches_completion() {
        let composition = Arc::new(Mutex::new(Vec::<f32>::new()));
        let chunks = Arc::new(Mutex::new(Vec::<f32>::new()));
        let composition_log = composition.clone();
        let chunk_log = chunks.clone();

        let mut pipeline = Pipeline::new(StageConfig::with_seed(12));
        pipeline.add_stage(
            CompositionStage::new(CompositionConfig::fine(8)).with_progress(Arc::new(move |p: f32| {
                composition_log.lock().unwrap().push(p)
            })),
        );
        pipeline.add_stage(
            ChunkStage::new(
                small_chunks(),
                detail(),
                ChunkSelection::Region {
                    x: 0,
                    y: 0,
                    width: 3,
                    height: 2,
                },
                Arc::new(CollectingSink::default()),
            )
            .with_progress(Arc::new(move |p: f32| chunk_log.lock().unwrap().push(p))),
        );
        pipeline.run(&mut World::default()).unwrap();

        let composition = composition.lock().unwrap();
        assert!(!composition.is_empty());
        assert!(composition.windows(2).all(|w| w[0] <= w[1]));
        assert!(composition.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(composition.last(), Some(&1.0));

        // Worker threads report in any order, but each count appears once.
        let mut chunks = chunks.lock().unwrap().clone();
        chunks.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(chunks.len(), 6);
        assert_eq!(chunks.last(), Some(&1.0));
    }

    #[test]
    fn test_pipeline_with_callbacks() {
        let sink = Arc::new(CollectingSink::default());
        let region = ChunkSelection::Region {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        };
        let pipeline = chunk_pipeline(3, region, sink);
        assert_eq!(pipeline.stage_count(), 2);

        let mut started = Vec::new();
        let mut completed = Vec::new();
        pipeline
            .run_with_callbacks(
                &mut World::default(),
                |name, i, total| started.push((name.to_string(), i, total)),
                |name, i, _| completed.push((name.to_string(), i)),
            )
            .unwrap();

        assert_eq!(
            started,
            vec![
                ("Biome Composition".to_string(), 0, 2),
                ("Chunk Generation".to_string(), 1, 2)
            ]
        );
        assert_eq!(completed.len(), 2);
    }
}
