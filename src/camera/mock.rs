//! Recording USB transport for tests

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::camera::error::{CameraError, Result};
use crate::camera::protocol::{ControlTransfer, HANDSHAKE_RESPONSE};
use crate::camera::transport::{UsbHost, UsbTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Timeout,
    Permission,
    Device,
}

impl Failure {
    fn into_error(self) -> CameraError {
        match self {
            Failure::Timeout => CameraError::TransferTimeout,
            Failure::Permission => CameraError::PermissionDenied("mock access denied".to_string()),
            Failure::Device => CameraError::DeviceError("mock device error".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Claim,
    Control(ControlTransfer),
    Bulk { length: usize },
}

/// What a bulk read returns.
#[derive(Debug, Clone)]
pub enum BulkReply {
    /// Copied into the buffer; may be shorter than requested.
    Data(Vec<u8>),
    /// Fills the whole buffer with one byte.
    Fill(u8),
    Fail(Failure),
}

struct State {
    calls: Vec<Call>,
    claim_failure: Option<Failure>,
    control_failure: Option<(usize, Failure)>,
    control_count: usize,
    handshake: Vec<u8>,
    bulk_script: VecDeque<BulkReply>,
    bulk_default: BulkReply,
    bulk_delay: Option<Duration>,
}

/// Cheap to clone; clones share the same recording.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                calls: Vec::new(),
                claim_failure: None,
                control_failure: None,
                control_count: 0,
                handshake: HANDSHAKE_RESPONSE.to_vec(),
                bulk_script: VecDeque::new(),
                bulk_default: BulkReply::Fill(0),
                bulk_delay: None,
            })),
        }
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_claim(self, failure: Failure) -> Self {
        self.state.lock().claim_failure = Some(failure);
        self
    }

    /// Fails the `nth` control transfer (0-based) with `failure`.
    pub fn fail_control_at(self, nth: usize, failure: Failure) -> Self {
        self.state.lock().control_failure = Some((nth, failure));
        self
    }

    pub fn handshake(self, response: &[u8]) -> Self {
        self.state.lock().handshake = response.to_vec();
        self
    }

    /// Replies served in order before falling back to the default.
    pub fn script_bulk(self, replies: impl IntoIterator<Item = BulkReply>) -> Self {
        self.state.lock().bulk_script.extend(replies);
        self
    }

    pub fn bulk_default(self, reply: BulkReply) -> Self {
        self.state.lock().bulk_default = reply;
        self
    }

    pub fn bulk_delay(self, delay: Duration) -> Self {
        self.state.lock().bulk_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn control_calls(&self) -> Vec<ControlTransfer> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Control(transfer) => Some(transfer),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.state.lock().calls.clear();
    }

    fn control(&mut self, transfer: ControlTransfer) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::Control(transfer));
        let nth = state.control_count;
        state.control_count += 1;
        match state.control_failure {
            Some((at, failure)) if at == nth => Err(failure.into_error()),
            _ => Ok(()),
        }
    }
}

impl UsbTransport for MockTransport {
    fn claim_interface(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::Claim);
        match state.claim_failure {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }

    fn write_control(&mut self, request: u8, value: u16, index: u16, _timeout: Duration) -> Result<()> {
        self.control(ControlTransfer::write(request, value, index))
    }

    fn read_control(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        _timeout: Duration,
    ) -> Result<usize> {
        self.control(ControlTransfer::read(request, value, index, buf.len() as u16))?;
        let state = self.state.lock();
        let n = state.handshake.len().min(buf.len());
        buf[..n].copy_from_slice(&state.handshake[..n]);
        Ok(n)
    }

    fn read_bulk(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let (reply, delay) = {
            let mut state = self.state.lock();
            state.calls.push(Call::Bulk { length: buf.len() });
            let scripted = state.bulk_script.pop_front();
            let reply = scripted.unwrap_or_else(|| state.bulk_default.clone());
            (reply, state.bulk_delay)
        };

        if let Some(delay) = delay {
            thread::sleep(delay);
        }

        match reply {
            BulkReply::Data(data) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            BulkReply::Fill(value) => {
                buf.fill(value);
                Ok(buf.len())
            }
            BulkReply::Fail(failure) => Err(failure.into_error()),
        }
    }
}

/// Host that finds the wrapped transport, if any, for every vendor id it is asked about.
pub struct MockHost {
    transport: Option<MockTransport>,
    pub searched: Mutex<Vec<u16>>,
}

impl MockHost {
    pub fn with(transport: MockTransport) -> Self {
        Self {
            transport: Some(transport),
            searched: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self {
            transport: None,
            searched: Mutex::new(Vec::new()),
        }
    }
}

impl UsbHost for MockHost {
    type Transport = MockTransport;

    fn find_device(&self, vendor_id: u16) -> Result<Option<MockTransport>> {
        self.searched.lock().push(vendor_id);
        Ok(self.transport.clone())
    }
}
