use std::thread;
use std::time::Duration;

use scopetek_rs::camera::{
    CameraError, CaptureParameters, ControllerConfig, DeviceController, Resolution, RusbHost,
    SpeedMode, StreamPipeline,
};
use scopetek_rs::logger;

use tracing::{error, info, warn};

const FRAMES_TO_CAPTURE: usize = 100;

const PERMISSION_HELP: &str = "\
Permission denied to access camera.

To fix this on Linux:
1. Edit /etc/udev/rules.d/50-scopetek.rules, add the following (you may need to choose a different group):
    SUBSYSTEMS==\"usb\", ATTRS{idVendor}==\"0547\", GROUP=\"plugdev\", MODE=\"0666\"
2. Restart udev:
    sudo udevadm control --reload
3. Unplug/replug the device and try again.
";

fn main() -> anyhow::Result<()> {
    logger::init();

    info!("Starting scopetek capture...");

    let host = RusbHost::new()?;
    let config = ControllerConfig::builder()
        .bulk_timeout(Duration::from_secs(1))
        .build();

    let mut controller = match DeviceController::open(&host, config) {
        Ok(controller) => controller,
        Err(e @ CameraError::PermissionDenied(_)) => {
            eprintln!("{}", PERMISSION_HELP);
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let params = CaptureParameters::builder()
        .resolution(Resolution::VGA)
        .exposure(131e-3)
        .speed(SpeedMode::Fast)
        .gain(1)
        .build();
    controller.configure(&params)?;

    let white_balance = controller.auto_white_balance()?;
    info!("White balance: {:?}", white_balance.factors());

    let mut pipeline = StreamPipeline::new(controller);
    pipeline.start()?;

    let mut captured = 0;
    while captured < FRAMES_TO_CAPTURE {
        let frames = pipeline.drain_all_frames();
        let Some(latest) = frames.last() else {
            if !pipeline.is_running() {
                warn!("Capture loop exited early");
                break;
            }
            thread::sleep(Duration::from_millis(5));
            continue;
        };

        // Only the newest frame matters; the backlog is dropped undecoded.
        captured += frames.len();
        let image = latest.decode();
        let mean = image.data.iter().map(|&v| v as u64).sum::<u64>() / image.data.len() as u64;
        info!(
            "frame {}x{} mean={} fps={:.1} skipped={}",
            image.width,
            image.height,
            mean,
            pipeline.fps().unwrap_or(0.0),
            frames.len() - 1
        );
    }

    match pipeline.shutdown() {
        Ok(()) => info!("Captured {} frames", captured),
        Err(e) => error!("Capture failed: {}", e),
    }

    Ok(())
}
