// src/engine/pipeline.rs
//
// The batch scheduler: expands (images x presets) into a task list, runs
// the tasks on a bounded set of workers pulling from a shared atomic
// cursor, and collects results ordered by original task index regardless
// of completion order.

use crate::engine::pool::{get_pool, MAX_CONCURRENCY};
use crate::engine::{encoder, transform, SourceImage};
use crate::error::PixelbatchError;
use crate::filename::{format_filename, FilenameContext};
use crate::preset::Preset;
use crate::util::generate_id;
use image::RgbaImage;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};

/// Default number of concurrent workers per batch.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// One (image, preset) pairing with its authoritative position in the
/// output ordering: images outer loop, presets inner loop.
#[derive(Debug, Clone, Copy)]
pub struct RenderTask {
    pub index: usize,
    pub image_index: usize,
    pub preset_index: usize,
}

/// One produced artifact.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub id: String,
    pub source_id: String,
    pub preset_id: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub filename: String,
    /// The rendered raster, shared so the combined-icon packager can reuse
    /// it without re-decoding the encoded bytes.
    pub raster: Arc<RgbaImage>,
}

impl RenderResult {
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }
}

/// One failed task. Collected separately; never aborts the batch.
#[derive(Debug, Clone)]
pub struct RenderError {
    pub task_index: usize,
    pub source_id: String,
    pub source_name: String,
    pub preset_id: String,
    pub preset_name: String,
    pub error: PixelbatchError,
}

/// Advisory progress notification, one per completed task.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub completed: usize,
    pub total: usize,
    pub source_id: String,
    pub preset_id: String,
    /// Filename of the finished artifact; None when the task failed.
    pub filename: Option<String>,
}

/// What a finished batch hands back: results in task order, errors sorted
/// by task index.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<RenderResult>,
    pub errors: Vec<RenderError>,
}

/// The batch scheduler. Construct once, call `process` per batch.
///
/// A `process` call while another is running is a caller error; the
/// `is_processing` flag is advisory for UI gating, not a lock.
pub struct BatchPipeline {
    concurrency: usize,
    processing: AtomicBool,
    progress: Option<mpsc::Sender<ProgressEvent>>,
}

impl Default for BatchPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchPipeline {
    pub fn new() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            processing: AtomicBool::new(false),
            progress: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Attach a progress channel. Send failures (receiver dropped) are
    /// ignored; progress must never affect pipeline correctness.
    pub fn with_progress(mut self, sender: mpsc::Sender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Run the cross product of images and presets. Empty inputs return an
    /// empty outcome without ever entering the processing state.
    pub fn process(&self, images: &[SourceImage], presets: &[Preset]) -> BatchOutcome {
        self.process_inner(images, presets, self.progress.as_ref())
    }

    /// Like `process`, with a progress channel for this batch only.
    pub fn process_with_events(
        &self,
        images: &[SourceImage],
        presets: &[Preset],
        sender: &mpsc::Sender<ProgressEvent>,
    ) -> BatchOutcome {
        self.process_inner(images, presets, Some(sender))
    }

    fn process_inner(
        &self,
        images: &[SourceImage],
        presets: &[Preset],
        progress: Option<&mpsc::Sender<ProgressEvent>>,
    ) -> BatchOutcome {
        if images.is_empty() || presets.is_empty() {
            return BatchOutcome::default();
        }

        self.processing.store(true, Ordering::SeqCst);

        let tasks: Vec<RenderTask> = (0..images.len())
            .flat_map(|image_index| {
                (0..presets.len()).map(move |preset_index| RenderTask {
                    index: image_index * presets.len() + preset_index,
                    image_index,
                    preset_index,
                })
            })
            .collect();
        let total = tasks.len();

        let cursor = AtomicUsize::new(0);
        // Guards the count and the matching send as one step so events
        // arrive in strictly increasing order
        let completed = Mutex::new(0usize);
        let mut slots: Vec<Mutex<Option<RenderResult>>> = Vec::with_capacity(total);
        slots.resize_with(total, || Mutex::new(None));
        let errors: Mutex<Vec<RenderError>> = Mutex::new(Vec::new());

        let workers = self.concurrency.min(total);
        get_pool().scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|_| {
                    loop {
                        let claimed = cursor.fetch_add(1, Ordering::SeqCst);
                        if claimed >= total {
                            break;
                        }
                        let task = tasks[claimed];
                        let image = &images[task.image_index];
                        let preset = &presets[task.preset_index];

                        let mut filename = None;
                        match run_task(image, preset) {
                            Ok(result) => {
                                filename = Some(result.filename.clone());
                                *slots[task.index].lock() = Some(result);
                            }
                            Err(error) => errors.lock().push(RenderError {
                                task_index: task.index,
                                source_id: image.id.clone(),
                                source_name: image.name.clone(),
                                preset_id: preset.id.clone(),
                                preset_name: preset.name.clone(),
                                error,
                            }),
                        }

                        let mut done = completed.lock();
                        *done += 1;
                        if let Some(sender) = progress {
                            let _ = sender.send(ProgressEvent {
                                completed: *done,
                                total,
                                source_id: image.id.clone(),
                                preset_id: preset.id.clone(),
                                filename,
                            });
                        }
                    }
                });
            }
        });

        // Compact in task order: failed tasks leave no gap in the results
        let results = slots
            .into_iter()
            .filter_map(|slot| slot.into_inner())
            .collect();
        let mut errors = errors.into_inner();
        errors.sort_by_key(|e| e.task_index);

        self.processing.store(false, Ordering::SeqCst);
        BatchOutcome { results, errors }
    }
}

fn run_task(image: &SourceImage, preset: &Preset) -> Result<RenderResult, PixelbatchError> {
    let raster = transform::render(image.raster(), preset)?;
    let (width, height) = raster.dimensions();
    let encoded = encoder::encode(&raster, preset)?;
    let context = FilenameContext::new(image, preset, width, height);
    let filename = format_filename(&preset.filename_pattern, &context);

    Ok(RenderResult {
        id: generate_id(),
        source_id: image.id.clone(),
        preset_id: preset.id.clone(),
        width,
        height,
        bytes: encoded.bytes,
        mime: encoded.mime,
        filename,
        raster: Arc::new(raster),
    })
}
