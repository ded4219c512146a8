//! Background capture loop feeding an unbounded frame queue
//!
//! ```text
//! Stopped --start()--> Running --stop() + loop exits--> Stopped
//! ```
//!
//! Cancellation is cooperative: the loop checks the stop flag only between bulk
//! reads, so a stop request takes effect within one read (bounded by
//! [`ControllerConfig::bulk_timeout`](crate::camera::ControllerConfig)).
//! Halting the loop does not halt the sensor; call
//! [`DeviceController::stop`] once the loop has exited, or use
//! [`StreamPipeline::shutdown`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::camera::controller::DeviceController;
use crate::camera::error::{CameraError, Result};
use crate::camera::transport::UsbTransport;
use crate::image_pipeline::{Frame, SharedWhiteBalance, WhiteBalance};


type LoopOutcome<T> = (DeviceController<T>, Result<()>);

pub struct StreamPipeline<T: UsbTransport + 'static> {
    controller: Option<DeviceController<T>>,
    worker: Option<JoinHandle<LoopOutcome<T>>>,
    stop_flag: Arc<AtomicBool>,
    sender: Sender<Frame>,
    receiver: Receiver<Frame>,
    white_balance: SharedWhiteBalance,
    fps: Arc<Mutex<Option<f64>>>,
}

impl<T: UsbTransport + 'static> StreamPipeline<T> {
    /// Wraps a configured controller. Nothing is read until [`start`](Self::start).
    pub fn new(controller: DeviceController<T>) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            white_balance: controller.white_balance(),
            controller: Some(controller),
            worker: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            sender,
            receiver,
            fps: Arc::new(Mutex::new(None)),
        }
    }

    /// Moves the controller onto a dedicated capture thread.
    pub fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Err(CameraError::AlreadyStreaming);
        }
        let mut controller = self.controller.take().ok_or(CameraError::AlreadyStreaming)?;
        if controller.parameters().is_none() {
            self.controller = Some(controller);
            return Err(CameraError::NotConfigured);
        }

        controller.reset_frame_rate();
        *self.fps.lock() = None;
        self.stop_flag.store(false, Ordering::Release);

        let stop_flag = self.stop_flag.clone();
        let sender = self.sender.clone();
        let fps = self.fps.clone();

        // On spawn failure the closure, and the controller with it, is dropped,
        // which halts the sensor.
        let worker = thread::Builder::new()
            .name("scopetek-capture".to_string())
            .spawn(move || capture_loop(controller, stop_flag, sender, fps))?;

        info!("Capture stream started");
        self.worker = Some(worker);
        Ok(())
    }

    /// Asks the capture loop to exit after its current read. Does not wait.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    /// True while the capture loop is still iterating.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Blocks until the capture loop exits and takes the controller back.
    ///
    /// Returns the read error that ended the loop, if one did. Calling this
    /// without [`stop`](Self::stop) waits for such an error.
    pub fn wait(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        let (controller, outcome) = worker
            .join()
            .map_err(|_| CameraError::DeviceError("capture thread panicked".to_string()))?;
        self.controller = Some(controller);
        info!("Capture stream stopped");
        outcome
    }

    /// Stops the loop, waits for it and halts the sensor.
    pub fn shutdown(&mut self) -> Result<()> {
        self.stop();
        let outcome = self.wait();
        if let Some(controller) = self.controller.as_mut() {
            controller.stop();
        }
        outcome
    }

    /// The controller, while no capture loop owns it.
    pub fn controller_mut(&mut self) -> Option<&mut DeviceController<T>> {
        self.controller.as_mut()
    }

    /// Waits for the loop and gives the controller back, discarding queued frames.
    pub fn into_controller(mut self) -> Result<DeviceController<T>> {
        self.wait()?;
        self.controller
            .take()
            .ok_or_else(|| CameraError::DeviceError("controller lost with capture thread".to_string()))
    }

    /// Removes and returns the oldest queued frame without blocking.
    pub fn get_oldest_frame(&self) -> Option<Frame> {
        self.receiver.try_recv().ok()
    }

    /// Removes every frame queued right now, oldest first, without blocking.
    pub fn drain_all_frames(&self) -> Vec<Frame> {
        let pending = self.receiver.len();
        self.receiver.try_iter().take(pending).collect()
    }

    pub fn pending_frames(&self) -> usize {
        self.receiver.len()
    }

    pub fn fps(&self) -> Option<f64> {
        *self.fps.lock()
    }

    pub fn white_balance(&self) -> SharedWhiteBalance {
        self.white_balance.clone()
    }

    /// Estimates the white balance from `frame`; frames read afterwards use it.
    pub fn estimate_white_balance(&self, frame: &Frame) -> WhiteBalance {
        self.white_balance.update_from(frame)
    }
}

impl<T: UsbTransport + 'static> Drop for StreamPipeline<T> {
    fn drop(&mut self) {
        // The detached loop exits after its current read and drops the
        // controller, which halts the sensor.
        if self.worker.is_some() {
            warn!("Capture stream dropped while running");
            self.stop();
        }
    }
}

fn capture_loop<T: UsbTransport>(
    mut controller: DeviceController<T>,
    stop_flag: Arc<AtomicBool>,
    sender: Sender<Frame>,
    fps: Arc<Mutex<Option<f64>>>,
) -> LoopOutcome<T> {
    let outcome = loop {
        if stop_flag.load(Ordering::Acquire) {
            break Ok(());
        }

        match controller.read_frame() {
            Ok(frame) => {
                *fps.lock() = controller.fps();
                if sender.send(frame).is_err() {
                    break Ok(());
                }
            }
            Err(e) => {
                error!("Capture loop aborted: {}", e);
                break Err(e);
            }
        }
    };

    (controller, outcome)
}
