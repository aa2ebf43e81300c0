//! The simulated mote.
//!
//! Speaks the mote side of the serial API: decodes host requests, answers them
//! from a parameter store and a small state machine, and raises notifications
//! with its own sequence bit. Output bytes accumulate until taken with
//! [`SimulatedMote::take_output`].

use ipmt_link::*;
use tracing::{debug, trace, warn};

use crate::error::{SimError, SimResult};
use crate::params::{MoteParams, SimConfig};

/// First socket id handed out by `openSocket`.
const FIRST_SOCKET_ID: u8 = 22;
/// Sockets the mote can hold open.
const MAX_SOCKETS: usize = 4;
/// Slot length reported in `netInfo`, in microseconds.
const SLOT_SIZE_US: u16 = 7250;

/// Acknowledgement received from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub cmd_id: u8,
    pub seq: bool,
}

#[derive(Debug, Clone)]
struct Socket {
    id: u8,
    port: Option<u16>,
}

/// A mote answering the serial API in-process.
pub struct SimulatedMote {
    params: MoteParams,
    state: u8,
    up_time: u32,
    asleep: bool,
    auto_reply: bool,

    receiver: HdlcReceiver,
    sender: HdlcSender,
    output: Vec<u8>,

    tx_seq: Option<bool>,
    rx_seq: Option<bool>,
    request_seq: bool,
    last_reply: Option<Vec<u8>>,
    last_notification: Option<Vec<u8>>,

    acks: Vec<Ack>,
    requests: Vec<Command>,
    sockets: Vec<Socket>,
    next_socket_id: u8,
    services: Vec<ServiceInfo>,
}

impl Default for SimulatedMote {
    fn default() -> Self {
        Self::new(MoteParams::default())
    }
}

impl SimulatedMote {
    /// Create an idle mote. No boot event is sent.
    pub fn new(params: MoteParams) -> Self {
        SimulatedMote {
            params,
            state: MOTE_STATE_IDLE,
            up_time: 0,
            asleep: false,
            auto_reply: true,
            receiver: HdlcReceiver::new(HDLC_INPUT_BUFFER_SIZE),
            sender: HdlcSender::new(),
            output: Vec::new(),
            tx_seq: None,
            rx_seq: None,
            request_seq: false,
            last_reply: None,
            last_notification: None,
            acks: Vec::new(),
            requests: Vec::new(),
            sockets: Vec::new(),
            next_socket_id: FIRST_SOCKET_ID,
            services: Vec::new(),
        }
    }

    /// Create a mote from configuration, booting it if configured to.
    pub fn from_config(config: &SimConfig) -> SimResult<Self> {
        let mut mote = Self::new(config.to_params()?);
        if config.boot_event {
            mote.boot()?;
        }
        Ok(mote)
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    pub fn params(&self) -> &MoteParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut MoteParams {
        &mut self.params
    }

    /// Current `MOTE_STATE_*`.
    pub fn state(&self) -> u8 {
        self.state
    }

    /// Acknowledgements received from the host, oldest first.
    pub fn acks(&self) -> &[Ack] {
        &self.acks
    }

    /// Requests received from the host, oldest first. Retransmissions are not
    /// recorded twice.
    pub fn requests(&self) -> &[Command] {
        &self.requests
    }

    /// When disabled the mote records requests but never answers them.
    pub fn set_auto_reply(&mut self, enabled: bool) {
        self.auto_reply = enabled;
    }

    /// Advance the uptime clock.
    pub fn advance(&mut self, seconds: u32) {
        self.up_time = self.up_time.wrapping_add(seconds);
    }

    /// Bytes written towards the host since the last call.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    // ------------------------------------------------------------------------
    // Host → mote
    // ------------------------------------------------------------------------

    /// Feed bytes received from the host.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if let Some(FrameEvent::Frame(frame)) = self.receiver.push_byte(byte) {
                self.on_frame(&frame);
            }
        }
    }

    fn on_frame(&mut self, frame: &[u8]) {
        if frame.len() < SERIAL_HEADER_LEN {
            trace!(len = frame.len(), "sim: runt frame");
            return;
        }
        let cmd_id = frame[0];
        let length = frame[1] as usize;
        let flags = frame[2];
        let Some(payload) = frame.get(SERIAL_HEADER_LEN..SERIAL_HEADER_LEN + length) else {
            trace!(cmd_id, length, "sim: length exceeds frame");
            return;
        };

        if flags & FLAG_RESPONSE != 0 {
            let ack = Ack {
                cmd_id,
                seq: flags & FLAG_PACKET_ID != 0,
            };
            trace!(?ack, "sim: ack received");
            self.acks.push(ack);
            return;
        }

        if self.asleep {
            trace!(cmd_id, "sim: asleep, request ignored");
            return;
        }

        let seq = flags & FLAG_PACKET_ID != 0;
        if flags & FLAG_SYNC == 0 && self.rx_seq == Some(seq) {
            debug!(cmd_id, seq, "sim: retransmitted request");
            if let Some(reply) = self.last_reply.clone() {
                self.write_frame(&reply);
            }
            return;
        }
        self.rx_seq = Some(seq);
        self.request_seq = seq;

        let command = Command::decode(cmd_id, payload);
        if let Some(command) = &command {
            self.requests.push(command.clone());
        }
        if !self.auto_reply {
            return;
        }

        match command {
            Some(command) => self.execute(command),
            None => self.reject(cmd_id, payload),
        }
    }

    fn reject(&mut self, cmd_id: u8, payload: &[u8]) {
        let param_id = payload.first().copied();
        let parameterized = cmd_id == CMDID_SET_PARAMETER || cmd_id == CMDID_GET_PARAMETER;
        let rc = match lookup(cmd_id, param_id) {
            Some(_) => ResultCode::InvalidLen,
            None if parameterized => ResultCode::UnknownParam,
            None => ResultCode::UnknownCmd,
        };
        debug!(cmd_id, %rc, "sim: request rejected");
        let echo = if parameterized { param_id } else { None };
        self.reply(cmd_id, rc, echo, &[]);
    }

    fn execute(&mut self, command: Command) {
        let kind = command.kind();
        let mut followups = Vec::new();
        let mut reboot = false;

        let (rc, data) = match command {
            Command::SetParameter(value) => (self.set_parameter(value), ReplyData::Empty),
            Command::GetParameter(param) => (ResultCode::Ok, self.get_parameter(param)),
            Command::Join => {
                if self.state != MOTE_STATE_IDLE {
                    (ResultCode::InvalidState, ReplyData::Empty)
                } else {
                    self.state = MOTE_STATE_OPERATIONAL;
                    followups.extend(self.events(EVENT_JOIN_STARTED | EVENT_OPERATIONAL));
                    (ResultCode::Ok, ReplyData::Empty)
                }
            }
            Command::Disconnect => {
                if self.state == MOTE_STATE_IDLE {
                    (ResultCode::InvalidState, ReplyData::Empty)
                } else {
                    self.state = MOTE_STATE_IDLE;
                    self.services.clear();
                    followups.extend(self.events(EVENT_DISCONNECTED));
                    (ResultCode::Ok, ReplyData::Empty)
                }
            }
            Command::Reset => {
                reboot = true;
                (ResultCode::Ok, ReplyData::Empty)
            }
            Command::LowPowerSleep => {
                self.asleep = true;
                (ResultCode::Ok, ReplyData::Empty)
            }
            Command::Search => {
                if self.state != MOTE_STATE_IDLE {
                    (ResultCode::InvalidState, ReplyData::Empty)
                } else {
                    self.state = MOTE_STATE_SEARCHING;
                    (ResultCode::Ok, ReplyData::Empty)
                }
            }
            Command::TestRadioRx(_) | Command::TestRadioTxExt(_) => {
                let rc = if self.state == MOTE_STATE_IDLE {
                    ResultCode::Ok
                } else {
                    ResultCode::InvalidState
                };
                (rc, ReplyData::Empty)
            }
            Command::ClearNv => {
                self.params.clear_nv();
                (ResultCode::Ok, ReplyData::Empty)
            }
            Command::Zeroize => {
                self.params.zeroize();
                (ResultCode::Ok, ReplyData::Empty)
            }
            Command::RequestService(args) => {
                if self.state != MOTE_STATE_OPERATIONAL {
                    (ResultCode::InvalidState, ReplyData::Empty)
                } else {
                    self.services
                        .retain(|s| (s.dest_addr, s.service_type) != (args.dest_addr, args.service_type));
                    self.services.push(ServiceInfo {
                        dest_addr: args.dest_addr,
                        service_type: args.service_type,
                        state: 0,
                        value: args.value,
                    });
                    followups.extend(self.events(EVENT_SVC_CHANGE));
                    (ResultCode::Ok, ReplyData::Empty)
                }
            }
            Command::GetServiceInfo(args) => {
                let info = self
                    .services
                    .iter()
                    .find(|s| (s.dest_addr, s.service_type) == (args.dest_addr, args.service_type))
                    .cloned()
                    .unwrap_or(ServiceInfo {
                        dest_addr: args.dest_addr,
                        service_type: args.service_type,
                        state: 0,
                        value: 0,
                    });
                (ResultCode::Ok, ReplyData::ServiceInfo(info))
            }
            Command::OpenSocket { protocol } => {
                if protocol != 0 {
                    (ResultCode::InvalidValue, ReplyData::Empty)
                } else if self.sockets.len() >= MAX_SOCKETS {
                    (ResultCode::NoResources, ReplyData::Empty)
                } else {
                    let socket_id = self.next_socket_id;
                    self.next_socket_id = self.next_socket_id.wrapping_add(1);
                    self.sockets.push(Socket {
                        id: socket_id,
                        port: None,
                    });
                    (ResultCode::Ok, ReplyData::OpenSocket { socket_id })
                }
            }
            Command::CloseSocket { socket_id } => {
                let before = self.sockets.len();
                self.sockets.retain(|s| s.id != socket_id);
                let rc = if self.sockets.len() < before {
                    ResultCode::Ok
                } else {
                    ResultCode::NotFound
                };
                (rc, ReplyData::Empty)
            }
            Command::BindSocket(args) => {
                let rc = match self.sockets.iter_mut().find(|s| s.id == args.socket_id) {
                    Some(socket) => {
                        socket.port = Some(args.port);
                        ResultCode::Ok
                    }
                    None => ResultCode::NotFound,
                };
                (rc, ReplyData::Empty)
            }
            Command::SendTo(args) => {
                if !self.sockets.iter().any(|s| s.id == args.socket_id) {
                    (ResultCode::NotFound, ReplyData::Empty)
                } else if self.state != MOTE_STATE_OPERATIONAL {
                    (ResultCode::InvalidState, ReplyData::Empty)
                } else {
                    followups.push(Notification::TxDone(TxDone {
                        packet_id: args.packet_id,
                        status: 0,
                    }));
                    (ResultCode::Ok, ReplyData::Empty)
                }
            }
            Command::SocketInfo { index } => match self.sockets.get(index as usize) {
                Some(socket) => (
                    ResultCode::Ok,
                    ReplyData::SocketInfo(SocketInfo {
                        index,
                        socket_id: socket.id,
                        protocol: 0,
                        bind_state: u8::from(socket.port.is_some()),
                        port: socket.port.unwrap_or(0),
                    }),
                ),
                None => (ResultCode::NotFound, ReplyData::Empty),
            },
        };

        debug!(command = %kind, %rc, "sim: request executed");
        let fields = if rc.is_ok() { data.encode() } else { Vec::new() };
        self.reply(kind.cmd_id(), rc, kind.param_id(), &fields);

        for notification in followups {
            if let Err(err) = self.notify(&notification) {
                warn!(%err, "sim: notification dropped");
            }
        }
        if reboot {
            if let Err(err) = self.boot() {
                warn!(%err, "sim: boot event dropped");
            }
        }
    }

    fn set_parameter(&mut self, value: SetParameter) -> ResultCode {
        let params = &mut self.params;
        match value {
            SetParameter::MacAddress(v) => params.mac_address = v,
            SetParameter::JoinKey(v) => params.join_key = v,
            SetParameter::NetworkId(v) => params.network_id = v,
            SetParameter::TxPower(v) => params.tx_power = v,
            SetParameter::JoinDutyCycle(v) => params.join_duty_cycle = v,
            SetParameter::EventMask(v) => params.event_mask = v,
            SetParameter::OtapLockout(v) => params.otap_lockout = v,
            SetParameter::RoutingMode(v) => params.routing_mode = v,
            SetParameter::PowerSrcInfo(v) => params.power_src_info = v,
            SetParameter::AdvKey(v) => params.adv_key = v,
            SetParameter::AutoJoin(v) => params.auto_join = v,
        }
        ResultCode::Ok
    }

    fn get_parameter(&self, param: GetParameter) -> ReplyData {
        let params = &self.params;
        match param {
            GetParameter::MacAddress => ReplyData::MacAddress(params.mac_address),
            GetParameter::NetworkId => ReplyData::NetworkId(params.network_id),
            GetParameter::TxPower => ReplyData::TxPower(params.tx_power),
            GetParameter::JoinDutyCycle => ReplyData::JoinDutyCycle(params.join_duty_cycle),
            GetParameter::EventMask => ReplyData::EventMask(params.event_mask),
            GetParameter::MoteInfo => ReplyData::MoteInfo(params.mote_info.clone()),
            GetParameter::NetInfo => ReplyData::NetInfo(NetInfo {
                mac_address: params.mac_address,
                mote_id: params.mote_id,
                network_id: params.network_id,
                slot_size: SLOT_SIZE_US,
            }),
            GetParameter::MoteStatus => ReplyData::MoteStatus(MoteStatus {
                state: self.state,
                num_parents: if self.state == MOTE_STATE_OPERATIONAL { 2 } else { 0 },
                ..Default::default()
            }),
            GetParameter::Time => ReplyData::Time(TimeInfo {
                up_time: self.up_time,
                utc_secs: u64::from(self.up_time).to_be_bytes(),
                ..Default::default()
            }),
            GetParameter::Charge => ReplyData::Charge(Charge {
                q_total: self.up_time.wrapping_mul(3),
                up_time: self.up_time,
                temp_int: 22,
                temp_frac: 50,
            }),
            GetParameter::TestRadioRxStats => ReplyData::TestRadioRxStats(TestRadioRxStats::default()),
            GetParameter::OtapLockout => ReplyData::OtapLockout(params.otap_lockout),
            GetParameter::MoteId => ReplyData::MoteId(params.mote_id),
            GetParameter::Ipv6Address => ReplyData::Ipv6Address(params.ipv6_address()),
            GetParameter::RoutingMode => ReplyData::RoutingMode(params.routing_mode),
            GetParameter::AppInfo => ReplyData::AppInfo(params.app_info.clone()),
            GetParameter::PowerSrcInfo => ReplyData::PowerSrcInfo(params.power_src_info.clone()),
            GetParameter::AutoJoin => ReplyData::AutoJoin(params.auto_join),
        }
    }

    /// Events notification for the bits enabled in the event mask.
    fn events(&self, events: u32) -> Option<Notification> {
        let events = events & self.params.event_mask;
        (events != 0).then(|| {
            Notification::Events(Events {
                events,
                state: self.state,
                alarms_list: 0,
            })
        })
    }

    // ------------------------------------------------------------------------
    // Mote → host
    // ------------------------------------------------------------------------

    /// Restart: close sockets, drop sequence state and raise a boot event.
    pub fn boot(&mut self) -> SimResult<()> {
        self.state = MOTE_STATE_IDLE;
        self.up_time = 0;
        self.asleep = false;
        self.sockets.clear();
        self.services.clear();
        self.next_socket_id = FIRST_SOCKET_ID;
        self.tx_seq = None;
        self.rx_seq = None;
        self.last_reply = None;
        self.last_notification = None;

        match self.events(EVENT_BOOT) {
            Some(notification) => self.notify(&notification),
            None => Ok(()),
        }
    }

    /// Send a notification with the next sequence bit.
    pub fn notify(&mut self, notification: &Notification) -> SimResult<()> {
        self.send_notification_raw(notification.cmd_id(), &notification.encode())
    }

    /// Deliver a packet to the host as a `receive` notification.
    pub fn deliver_packet(
        &mut self,
        socket_id: u8,
        src_addr: Ipv6Address,
        src_port: u16,
        payload: &[u8],
    ) -> SimResult<()> {
        self.notify(&Notification::Receive(Receive {
            socket_id,
            src_addr,
            src_port,
            payload: payload.to_vec(),
        }))
    }

    /// Send an arbitrary peer-originated frame with the next sequence bit.
    pub fn send_notification_raw(&mut self, cmd_id: u8, payload: &[u8]) -> SimResult<()> {
        check_len(payload)?;

        let (seq, sync) = match self.tx_seq {
            None => (false, FLAG_SYNC),
            Some(seq) => (seq, 0),
        };
        let mut frame = vec![cmd_id, payload.len() as u8, (u8::from(seq) << 1) | sync];
        frame.extend_from_slice(payload);
        self.tx_seq = Some(!seq);

        trace!(cmd_id, seq, sync = sync != 0, "sim: notification");
        self.write_frame(&frame);
        self.last_notification = Some(frame);
        Ok(())
    }

    /// Send the last notification again, as a retransmission (SYNC cleared).
    /// Returns `false` if nothing was sent yet.
    pub fn retransmit_last_notification(&mut self) -> bool {
        match self.last_notification.clone() {
            Some(mut frame) => {
                frame[2] &= !FLAG_SYNC;
                self.write_frame(&frame);
                true
            }
            None => false,
        }
    }

    /// Send a reply frame without consulting the parameter store. `fields`
    /// follow the result code verbatim (include the parameter echo yourself).
    pub fn send_reply_raw(&mut self, cmd_id: u8, rc: u8, fields: &[u8]) -> SimResult<()> {
        let mut payload = Vec::with_capacity(fields.len() + 1);
        payload.push(rc);
        payload.extend_from_slice(fields);
        check_len(&payload)?;

        let flags = FLAG_RESPONSE | (u8::from(self.request_seq) << 1);
        let mut frame = vec![cmd_id, payload.len() as u8, flags];
        frame.extend_from_slice(&payload);
        self.write_frame(&frame);
        self.last_reply = Some(frame);
        Ok(())
    }

    fn reply(&mut self, cmd_id: u8, rc: ResultCode, param_id: Option<u8>, fields: &[u8]) {
        let mut body = Vec::with_capacity(fields.len() + 1);
        body.extend(param_id);
        body.extend_from_slice(fields);
        if let Err(err) = self.send_reply_raw(cmd_id, rc.into(), &body) {
            warn!(%err, "sim: reply dropped");
        }
    }

    fn write_frame(&mut self, frame: &[u8]) {
        self.sender.send_frame(&mut self.output, frame);
    }
}

fn check_len(payload: &[u8]) -> SimResult<()> {
    if payload.len() > MAX_FRAME_LENGTH {
        return Err(SimError::PayloadTooLarge {
            max: MAX_FRAME_LENGTH,
            actual: payload.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut receiver = HdlcReceiver::default();
        bytes
            .iter()
            .filter_map(|&b| match receiver.push_byte(b) {
                Some(FrameEvent::Frame(f)) => Some(f),
                _ => None,
            })
            .collect()
    }

    fn request(cmd_id: u8, flags: u8, payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![cmd_id, payload.len() as u8, flags];
        frame.extend_from_slice(payload);
        encode_frame(&frame)
    }

    #[test]
    fn test_boot_event_uses_sync() {
        let mut mote = SimulatedMote::default();
        mote.boot().unwrap();
        let out = frames(&mote.take_output());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0][0], CMDID_EVENTS);
        assert_eq!(out[0][2], FLAG_SYNC);
    }

    #[test]
    fn test_get_parameter_reply_echoes_param() {
        let mut mote = SimulatedMote::default();
        mote.feed(&request(CMDID_GET_PARAMETER, FLAG_SYNC, &[PARAMID_NETWORK_ID]));
        let out = frames(&mote.take_output());
        assert_eq!(
            out,
            vec![vec![CMDID_GET_PARAMETER, 4, FLAG_RESPONSE, RC_OK, PARAMID_NETWORK_ID, 0x04, 0xCD]]
        );
    }

    #[test]
    fn test_unknown_command_and_param() {
        let mut mote = SimulatedMote::default();
        mote.feed(&request(0x7F, FLAG_SYNC, &[]));
        mote.feed(&request(CMDID_GET_PARAMETER, FLAG_PACKET_ID, &[0x7F]));
        let out = frames(&mote.take_output());
        assert_eq!(out[0], vec![0x7F, 1, FLAG_RESPONSE, RC_UNKNOWN_CMD]);
        assert_eq!(
            out[1],
            vec![CMDID_GET_PARAMETER, 2, FLAG_RESPONSE | FLAG_PACKET_ID, RC_UNKNOWN_PARAM, 0x7F]
        );
    }

    #[test]
    fn test_retransmitted_request_gets_same_reply() {
        let mut mote = SimulatedMote::default();
        mote.feed(&request(CMDID_OPEN_SOCKET, FLAG_SYNC, &[0]));
        mote.feed(&request(CMDID_OPEN_SOCKET, 0, &[0]));
        let out = frames(&mote.take_output());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], out[1]);
        assert_eq!(mote.requests().len(), 1);
    }

    #[test]
    fn test_notifications_alternate_sequence() {
        let mut mote = SimulatedMote::default();
        let done = Notification::TxDone(TxDone { packet_id: 1, status: 0 });
        mote.notify(&done).unwrap();
        mote.notify(&done).unwrap();
        mote.notify(&done).unwrap();
        let flags: Vec<u8> = frames(&mote.take_output()).iter().map(|f| f[2]).collect();
        assert_eq!(flags, vec![FLAG_SYNC, FLAG_PACKET_ID, 0]);
    }

    #[test]
    fn test_retransmission_clears_sync() {
        let mut mote = SimulatedMote::default();
        assert!(!mote.retransmit_last_notification());
        mote.notify(&Notification::MacRx(MacRx { payload: vec![1] })).unwrap();
        assert!(mote.retransmit_last_notification());
        let out = frames(&mote.take_output());
        assert_eq!(out[0][2], FLAG_SYNC);
        assert_eq!(out[1][2], 0);
        assert_eq!(out[0][3..], out[1][3..]);
    }

    #[test]
    fn test_acks_are_recorded() {
        let mut mote = SimulatedMote::default();
        mote.feed(&encode_frame(&[CMDID_EVENTS, 0, FLAG_RESPONSE | FLAG_PACKET_ID, RC_OK]));
        assert_eq!(
            mote.acks(),
            &[Ack {
                cmd_id: CMDID_EVENTS,
                seq: true
            }]
        );
        assert!(mote.take_output().is_empty());
    }

    #[test]
    fn test_send_to_requires_operational_state() {
        let mut mote = SimulatedMote::default();
        mote.feed(&request(CMDID_OPEN_SOCKET, FLAG_SYNC, &[0]));
        let mut send = vec![FIRST_SOCKET_ID];
        send.extend_from_slice(&[0; 22]);
        mote.feed(&request(CMDID_SEND_TO, FLAG_PACKET_ID, &send));
        let out = frames(&mote.take_output());
        assert_eq!(out[1][3], RC_INVALID_STATE);
    }

    #[test]
    fn test_oversized_notification_is_refused() {
        let mut mote = SimulatedMote::default();
        let result = mote.send_notification_raw(CMDID_MAC_RX, &[0; 129]);
        assert_eq!(
            result,
            Err(SimError::PayloadTooLarge {
                max: 128,
                actual: 129
            })
        );
    }

    #[test]
    fn test_sleeping_mote_ignores_requests() {
        let mut mote = SimulatedMote::default();
        mote.feed(&request(CMDID_LOW_POWER_SLEEP, FLAG_SYNC, &[]));
        mote.take_output();
        mote.feed(&request(CMDID_JOIN, FLAG_PACKET_ID, &[]));
        assert!(mote.take_output().is_empty());
    }
}
