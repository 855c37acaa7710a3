// src/processing/parallel.rs
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use flume::{Receiver, Sender};
use gdal::Dataset;
use tracing::debug;

use crate::error::{Error, Result};
use crate::image::Image;
use crate::io::reader::{read_image, CatalogEntry};

struct ImageReadRequest {
    index: usize,
    entry: CatalogEntry,
}

type ImageReadResponse = (usize, Result<Image>);

/// Reads catalog images on a pool of I/O threads.
pub struct ParallelProcessor {
    io_threads: usize,
}

impl ParallelProcessor {
    pub fn new(io_threads: Option<usize>) -> Self {
        Self {
            io_threads: io_threads.unwrap_or_else(num_cpus::get).max(1),
        }
    }

    pub fn io_threads(&self) -> usize {
        self.io_threads
    }

    /// Reads every entry, returning images in the order of `entries`.
    /// The first read error is returned after all workers have stopped.
    pub fn read_images(&self, entries: Vec<CatalogEntry>, band_order: &[String]) -> Result<Vec<Image>> {
        let total = entries.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let (req_tx, req_rx) = flume::unbounded::<ImageReadRequest>();
        let (res_tx, res_rx) = flume::unbounded::<ImageReadResponse>();
        let band_order: Arc<[String]> = band_order.into();

        let workers: Vec<JoinHandle<()>> = (0..self.io_threads.min(total))
            .map(|_| {
                let req_rx: Receiver<ImageReadRequest> = req_rx.clone();
                let res_tx: Sender<ImageReadResponse> = res_tx.clone();
                let band_order = Arc::clone(&band_order);
                thread::spawn(move || {
                    for request in req_rx {
                        let image = read_entry(&request.entry, &band_order);
                        if res_tx.send((request.index, image)).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        drop(req_rx);
        drop(res_tx);

        for (index, entry) in entries.into_iter().enumerate() {
            // Workers only stop early once every request was consumed.
            let _ = req_tx.send(ImageReadRequest { index, entry });
        }
        drop(req_tx);

        let mut slots: Vec<Option<Result<Image>>> = (0..total).map(|_| None).collect();
        for (index, image) in res_rx {
            slots[index] = Some(image);
        }

        let mut panicked = false;
        for worker in workers {
            panicked |= worker.join().is_err();
        }
        if panicked {
            return Err(Error::WorkerPanicked);
        }

        let images = slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Err(Error::WorkerPanicked)))
            .collect::<Result<Vec<_>>>()?;
        debug!(count = images.len(), threads = self.io_threads, "read catalog images");
        Ok(images)
    }
}

fn read_entry(entry: &CatalogEntry, band_order: &[String]) -> Result<Image> {
    let dataset = Dataset::open(&entry.path)?;
    read_image(&dataset, entry, band_order)
}
