//! Executable icon extraction off the interactive thread.
//!
//! Extraction hits the filesystem, so it runs on a dedicated worker thread
//! fed through a channel. Requests are fire-and-forget: a failure leaves
//! the icon unset and is only logged. Results are delivered through the
//! supplied callback, which is expected to marshal back onto the
//! interactive thread (the tasks actor does this via its event channel).

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::unbounded;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::sys::app::{Icon, IconExtractor, IconSize};

type Deliver = Box<dyn FnOnce(Icon) + Send>;

struct Job {
    exe: PathBuf,
    size: IconSize,
    deliver: Deliver,
}

#[derive(Clone)]
pub struct IconLoader {
    jobs: crossbeam_channel::Sender<Job>,
    cache: Arc<DashMap<(PathBuf, IconSize), Icon>>,
}

impl IconLoader {
    pub fn spawn(extractor: Arc<dyn IconExtractor>) -> IconLoader {
        let (jobs, jobs_rx) = unbounded::<Job>();
        let cache: Arc<DashMap<(PathBuf, IconSize), Icon>> = Arc::new(DashMap::new());

        let worker_cache = cache.clone();
        thread::Builder::new()
            .name("icon-loader".to_string())
            .spawn(move || {
                while let Ok(job) = jobs_rx.recv() {
                    let key = (job.exe.clone(), job.size);
                    if let Some(icon) = worker_cache.get(&key) {
                        (job.deliver)(*icon);
                        continue;
                    }
                    match extractor.associated_icon(&job.exe, job.size) {
                        Ok(icon) => {
                            worker_cache.insert(key, icon);
                            (job.deliver)(icon);
                        }
                        Err(err) => {
                            debug!("icon extraction failed for {}: {err}", job.exe.display());
                        }
                    }
                }
                trace!("icon loader exiting");
            })
            .expect("failed to spawn icon-loader thread");

        IconLoader { jobs, cache }
    }

    /// Queue an extraction. `deliver` runs with the icon on success; on the
    /// caller's thread for cache hits, on the worker otherwise.
    pub fn request(
        &self,
        exe: PathBuf,
        size: IconSize,
        deliver: impl FnOnce(Icon) + Send + 'static,
    ) {
        if let Some(icon) = self.cache.get(&(exe.clone(), size)) {
            deliver(*icon);
            return;
        }
        _ = self.jobs.send(Job { exe, size, deliver: Box::new(deliver) });
    }
}
