use std::time::Duration;

use crate::camera::error::CameraError;
use crate::camera::mock::{BulkReply, Call, Failure, MockHost, MockTransport};
use crate::camera::protocol::{self, ControlTransfer, Direction};
use crate::camera::{
    CaptureParameters, ControllerConfig, DeviceController, Resolution, SpeedMode,
};
use crate::image_pipeline::{DemosaicMode, WhiteBalance};

fn open(transport: &MockTransport) -> DeviceController<MockTransport> {
    DeviceController::open(&MockHost::with(transport.clone()), ControllerConfig::default()).unwrap()
}

fn vga_fast() -> CaptureParameters {
    CaptureParameters::builder()
        .resolution(Resolution::VGA)
        .exposure(0.03)
        .fast(true)
        .gain(1)
        .build()
}

/// Header followed by an 8-bit mosaic whose R, G and B sites hold fixed values.
fn tinted_frame(resolution: Resolution, r: u8, g: u8, b: u8) -> Vec<u8> {
    let mut data = vec![0xff; protocol::header_len(resolution)];
    for y in 0..resolution.height {
        for x in 0..resolution.width {
            data.push(match (y % 2, x % 2) {
                (0, 0) => r,
                (1, 1) => b,
                _ => g,
            });
        }
    }
    data
}

#[test]
fn test_open_without_device() {
    let host = MockHost::empty();
    let result = DeviceController::<MockTransport>::open(&host, ControllerConfig::default());

    assert!(matches!(
        result,
        Err(CameraError::DeviceNotFound { vendor_id: 0x0547 })
    ));
    assert_eq!(*host.searched.lock(), vec![protocol::VENDOR_ID]);
}

#[test]
fn test_open_claims_interface() {
    let transport = MockTransport::new();
    let controller = open(&transport);

    assert_eq!(transport.calls(), vec![Call::Claim]);
    assert!(controller.parameters().is_none());
    assert_eq!(controller.fps(), None);
}

#[test]
fn test_open_permission_denied() {
    let transport = MockTransport::new().fail_claim(Failure::Permission);
    let result = DeviceController::open(&MockHost::with(transport), ControllerConfig::default());
    assert!(matches!(result, Err(CameraError::PermissionDenied(_))));
}

#[test]
fn test_open_other_claim_failure_is_device_error() {
    let transport = MockTransport::new().fail_claim(Failure::Timeout);
    let result = DeviceController::open(&MockHost::with(transport), ControllerConfig::default());
    assert!(matches!(result, Err(CameraError::DeviceError(_))));
}

#[test]
fn test_configure_sends_exact_sequence() {
    let transport = MockTransport::new();
    let mut controller = open(&transport);
    controller.configure(&vga_fast()).unwrap();

    assert_eq!(
        transport.control_calls(),
        vec![
            ControlTransfer::write(180, 0xc8, 0),
            ControlTransfer::write(179, 0, 0),
            ControlTransfer::write(183, 0x19, 0x06),
            ControlTransfer::read(182, 0, 0x11, 2),
            ControlTransfer::write(181, 0xa1, 0),
            ControlTransfer::write(183, 0x28, 0x35),
            ControlTransfer::write(183, 0x34, 0x09),
            ControlTransfer::write(181, 0xa0, 0),
            ControlTransfer::write(183, 0x10, 0x35),
            ControlTransfer::write(183, 701, 0x09),
        ]
    );
    assert_eq!(controller.parameters(), Some(&vga_fast()));
}

#[test]
fn test_configure_shape_is_the_same_for_every_resolution() {
    let expected_codes = [0xc8, 0xc7, 0xc6, 0xc0];

    for (resolution, code) in Resolution::SUPPORTED.into_iter().zip(expected_codes) {
        let transport = MockTransport::new();
        let mut controller = open(&transport);
        let params = CaptureParameters::builder()
            .resolution(resolution)
            .exposure(0.2)
            .speed(SpeedMode::Normal)
            .gain(3)
            .build();
        controller.configure(&params).unwrap();

        let calls = transport.control_calls();
        let shape: Vec<(Direction, u8, u16)> =
            calls.iter().map(|t| (t.direction, t.request, t.index)).collect();
        let expected_shape: Vec<(Direction, u8, u16)> = protocol::SETUP_SEQUENCE
            .iter()
            .map(|s| (s.direction, s.request, s.index))
            .collect();

        assert_eq!(shape, expected_shape, "sequence for {}", resolution);
        assert_eq!(calls[0].value, code);
        assert_eq!(calls[4].value, protocol::SPEED_NORMAL);
        assert_eq!(calls[8].value, 3 + 0x0f);
        assert_eq!(calls[9].value, 2338); // 0.2 * 11694, truncated
    }
}

#[test]
fn test_configure_normal_speed_registers() {
    let transport = MockTransport::new();
    let mut controller = open(&transport);
    controller
        .configure(&CaptureParameters::builder().exposure(0.1).build())
        .unwrap();

    let calls = transport.control_calls();
    assert_eq!(calls[4].value, 0xa0);
    assert_eq!(calls[8].value, 0x0f);
    assert_eq!(calls[9].value, 1169);
}

#[test]
fn test_configure_rejects_unsupported_resolution() {
    let transport = MockTransport::new();
    let mut controller = open(&transport);
    let params = CaptureParameters::builder()
        .resolution(Resolution::new(800, 600))
        .build();

    let result = controller.configure(&params);
    assert!(matches!(
        result,
        Err(CameraError::UnsupportedResolution { width: 800, height: 600 })
    ));
    assert!(transport.control_calls().is_empty());
}

#[test]
fn test_configure_rejects_bad_exposure() {
    let transport = MockTransport::new();
    let mut controller = open(&transport);

    for exposure in [0.0, -1.0, f64::NAN, 3.0] {
        let params = CaptureParameters::builder().exposure(exposure).fast(true).build();
        assert!(matches!(
            controller.configure(&params),
            Err(CameraError::InvalidParameter(_))
        ));
    }
    assert!(transport.control_calls().is_empty());
}

#[test]
fn test_configure_aborts_on_first_failed_transfer() {
    let transport = MockTransport::new().fail_control_at(3, Failure::Device);
    let mut controller = open(&transport);

    let result = controller.configure(&vga_fast());
    assert!(matches!(result, Err(CameraError::DeviceError(_))));
    assert_eq!(transport.control_calls().len(), 4);
    assert!(controller.parameters().is_none());
}

#[test]
fn test_configure_tolerates_unexpected_handshake() {
    let transport = MockTransport::new().handshake(&[0x00]);
    let mut controller = open(&transport);
    assert!(controller.configure(&vga_fast()).is_ok());
}

#[test]
fn test_request_next_frame() {
    let transport = MockTransport::new();
    let mut controller = open(&transport);
    controller.request_next_frame().unwrap();
    assert_eq!(transport.control_calls(), vec![protocol::QUEUE_FRAME]);
}

#[test]
fn test_stop_sends_halt() {
    let transport = MockTransport::new();
    let mut controller = open(&transport);
    controller.stop();
    assert_eq!(transport.control_calls(), vec![ControlTransfer::write(187, 0, 0)]);
}

#[test]
fn test_stop_swallows_transfer_errors() {
    let transport = MockTransport::new().fail_control_at(0, Failure::Timeout);
    let mut controller = open(&transport);
    controller.stop();
    controller.stop();
    assert_eq!(transport.control_calls().len(), 2);
}

#[test]
fn test_drop_halts_configured_device() {
    let transport = MockTransport::new();
    let mut controller = open(&transport);
    controller.configure(&vga_fast()).unwrap();
    drop(controller);

    assert_eq!(transport.control_calls().last(), Some(&protocol::STOP));
}

#[test]
fn test_drop_halts_after_failed_configure() {
    let transport = MockTransport::new().fail_control_at(5, Failure::Device);
    let mut controller = open(&transport);
    assert!(controller.configure(&vga_fast()).is_err());
    drop(controller);

    assert_eq!(transport.control_calls().last(), Some(&protocol::STOP));
}

#[test]
fn test_drop_after_stop_does_not_stop_twice() {
    let transport = MockTransport::new();
    let mut controller = open(&transport);
    controller.configure(&vga_fast()).unwrap();
    controller.stop();
    transport.clear();
    drop(controller);

    assert!(transport.calls().is_empty());
}

#[test]
fn test_drop_of_unconfigured_controller_is_silent() {
    let transport = MockTransport::new();
    drop(open(&transport));
    assert!(transport.control_calls().is_empty());
}

#[test]
fn test_read_frame_before_configure() {
    let transport = MockTransport::new();
    let mut controller = open(&transport);
    assert!(matches!(controller.read_frame(), Err(CameraError::NotConfigured)));
    assert_eq!(transport.calls(), vec![Call::Claim]);
}

#[test]
fn test_read_frame_of_zeros_decodes_to_black() {
    let transport = MockTransport::new();
    let mut controller = open(&transport);
    controller.configure(&vga_fast()).unwrap();
    transport.clear();

    let frame = controller.read_frame().unwrap();

    assert_eq!(
        transport.calls(),
        vec![
            Call::Bulk { length: 640 * 480 + 512 },
            Call::Control(protocol::QUEUE_FRAME),
        ]
    );
    assert_eq!((frame.width(), frame.height()), (640, 480));
    assert_eq!(frame.white_balance(), WhiteBalance::NEUTRAL);

    let image = frame.decode();
    assert_eq!(image.data.len(), 640 * 480 * 3);
    assert!(image.data.iter().all(|&v| v == 0));
}

#[test]
fn test_read_frame_strips_header() {
    let mut data = vec![0xee; 512];
    let payload: Vec<u8> = (0..640 * 480).map(|i| (i % 251) as u8).collect();
    data.extend_from_slice(&payload);

    let transport = MockTransport::new().script_bulk([BulkReply::Data(data)]);
    let mut controller = open(&transport);
    controller.configure(&vga_fast()).unwrap();

    let frame = controller.read_frame().unwrap();
    assert_eq!(frame.raw().data(), payload.as_slice());
}

#[test]
fn test_read_frame_full_width_uses_short_header() {
    let transport = MockTransport::new().bulk_default(BulkReply::Fill(7));
    let mut controller = open(&transport);
    controller
        .configure(&CaptureParameters::builder().resolution(Resolution::FULL).build())
        .unwrap();
    transport.clear();

    let frame = controller.read_frame().unwrap();
    assert_eq!(transport.calls()[0], Call::Bulk { length: 2592 * 1944 + 256 });
    assert_eq!(frame.raw().data().len(), 2592 * 1944);
    assert_eq!(protocol::header_len(Resolution::SXGA), 512);
}

#[test]
fn test_read_frame_short_read_is_discarded() {
    let transport = MockTransport::new().script_bulk([BulkReply::Data(vec![0; 100])]);
    let mut controller = open(&transport);
    controller.configure(&vga_fast()).unwrap();
    transport.clear();

    let result = controller.read_frame();
    assert!(matches!(
        result,
        Err(CameraError::ShortRead { expected: 307_712, received: 100 })
    ));
    assert_eq!(transport.calls(), vec![Call::Bulk { length: 307_712 }]);
}

#[test]
fn test_read_frame_timeout() {
    let transport = MockTransport::new().script_bulk([BulkReply::Fail(Failure::Timeout)]);
    let mut controller = open(&transport);
    controller.configure(&vga_fast()).unwrap();
    assert!(matches!(controller.read_frame(), Err(CameraError::TransferTimeout)));
}

#[test]
fn test_read_frame_measures_fps() {
    let transport = MockTransport::new().bulk_delay(Duration::from_millis(2));
    let mut controller = open(&transport);
    controller.configure(&vga_fast()).unwrap();

    let first = controller.read_frame().unwrap();
    assert_eq!(controller.fps(), None);
    let second = controller.read_frame().unwrap();

    let fps = controller.fps().unwrap();
    let interval = second.timestamp() - first.timestamp();
    assert!((fps - 1.0 / interval.as_secs_f64()).abs() < 1e-6);
}

#[test]
fn test_frames_snapshot_current_white_balance() {
    let transport = MockTransport::new();
    let mut controller = open(&transport);
    controller.configure(&vga_fast()).unwrap();

    let warm = WhiteBalance::new(2.0, 1.0, 1.0).unwrap();
    controller.white_balance().set(warm);
    let first = controller.read_frame().unwrap();

    let cool = WhiteBalance::new(1.0, 1.0, 2.0).unwrap();
    controller.white_balance().set(cool);
    let second = controller.read_frame().unwrap();

    assert_eq!(first.white_balance(), warm);
    assert_eq!(second.white_balance(), cool);
}

#[test]
fn test_frames_use_configured_demosaic_mode() {
    let transport = MockTransport::new();
    let config = ControllerConfig::builder()
        .demosaic_mode(DemosaicMode::Nearest)
        .build();
    let mut controller = DeviceController::open(&MockHost::with(transport), config).unwrap();
    controller.configure(&vga_fast()).unwrap();

    assert_eq!(controller.read_frame().unwrap().mode(), DemosaicMode::Nearest);
}

#[test]
fn test_auto_white_balance() {
    let frame = tinted_frame(Resolution::VGA, 50, 100, 25);
    let transport = MockTransport::new().script_bulk([BulkReply::Data(frame)]);
    let mut controller = open(&transport);
    controller.configure(&vga_fast()).unwrap();

    let wb = controller.auto_white_balance().unwrap();
    assert_eq!(wb.factors(), [2.0, 1.0, 4.0]);
    assert_eq!(controller.white_balance().snapshot(), wb);
}

#[test]
fn test_estimate_white_balance_from_frame() {
    let transport = MockTransport::new()
        .script_bulk([BulkReply::Data(tinted_frame(Resolution::VGA, 200, 100, 50))]);
    let mut controller = open(&transport);
    controller.configure(&vga_fast()).unwrap();

    let frame = controller.read_frame().unwrap();
    let wb = controller.estimate_white_balance(&frame);

    assert_eq!(wb.factors(), [1.0, 2.0, 4.0]);
    assert_eq!(controller.read_frame().unwrap().white_balance(), wb);
}

#[test]
fn test_controller_config_builder() {
    let config = ControllerConfig::builder()
        .bulk_timeout(Duration::from_millis(250))
        .white_balance(WhiteBalance::new(1.0, 1.1, 1.2).unwrap())
        .build();

    assert_eq!(config.bulk_timeout, Duration::from_millis(250));
    assert_eq!(config.control_timeout, Duration::from_secs(1));
    assert_eq!(config.demosaic_mode, DemosaicMode::Bilinear);
    assert_eq!(config.white_balance.factors(), [1.0, 1.1, 1.2]);
}
