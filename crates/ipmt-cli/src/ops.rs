//! The `ipmtctl` subcommands, run over a blocking [`Session`].

use std::io::Write;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use ipmt_link::*;
use tracing::debug;

/// Port the manager listens on for mote data.
pub const MANAGER_PORT: u16 = 0xF0B8;

/// Invoke `command` and require a successful reply.
fn call<T: ByteTransport>(
    session: &mut Session<T>,
    command: &Command,
    timeout: Duration,
) -> anyhow::Result<ReplyData> {
    let kind = command.kind();
    let reply = session
        .request(command, timeout)
        .with_context(|| format!("{} failed", kind))?;
    if !reply.is_ok() {
        bail!("{} returned {}", kind, reply.rc);
    }
    reply
        .data
        .ok_or_else(|| anyhow!("{} returned no data", kind))
}

fn get<T: ByteTransport>(
    session: &mut Session<T>,
    param: GetParameter,
    timeout: Duration,
) -> anyhow::Result<ReplyData> {
    call(session, &Command::GetParameter(param), timeout)
}

fn mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join("-")
}

fn state_name(state: u8) -> &'static str {
    match state {
        MOTE_STATE_INIT => "init",
        MOTE_STATE_IDLE => "idle",
        MOTE_STATE_SEARCHING => "searching",
        MOTE_STATE_NEGOTIATING => "negotiating",
        MOTE_STATE_CONNECTED => "connected",
        MOTE_STATE_OPERATIONAL => "operational",
        _ => "unknown",
    }
}

fn print_notification(out: &mut dyn Write, received: &ReceivedNotification) -> anyhow::Result<()> {
    match &received.notification {
        Notification::Events(ev) => writeln!(
            out,
            "events: 0x{:08x} state={} alarms=0x{:08x}",
            ev.events,
            state_name(ev.state),
            ev.alarms_list
        )?,
        Notification::Receive(rx) => writeln!(
            out,
            "receive: socket={} from port {} payload={}",
            rx.socket_id,
            rx.src_port,
            hex::encode(&rx.payload)
        )?,
        Notification::TxDone(done) => writeln!(
            out,
            "txDone: packet={} status={}",
            done.packet_id, done.status
        )?,
        other => writeln!(out, "{:?}", other)?,
    }
    Ok(())
}

// ============================================================================
// Subcommands
// ============================================================================

/// Print identity, network and status information.
pub fn info<T: ByteTransport>(
    session: &mut Session<T>,
    timeout: Duration,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    if let ReplyData::MoteInfo(info) = get(session, GetParameter::MoteInfo, timeout)? {
        writeln!(out, "serial number : {}", mac(&info.serial_number))?;
        writeln!(out, "api version   : {}", info.api_version)?;
        writeln!(out, "hardware      : model {} rev {}", info.hw_model, info.hw_rev)?;
        writeln!(
            out,
            "software      : {}.{}.{}.{}",
            info.sw_ver_major, info.sw_ver_minor, info.sw_ver_patch, info.sw_ver_build
        )?;
    }
    if let ReplyData::NetInfo(net) = get(session, GetParameter::NetInfo, timeout)? {
        writeln!(out, "mac address   : {}", mac(&net.mac_address))?;
        writeln!(out, "network id    : {}", net.network_id)?;
        writeln!(out, "mote id       : {}", net.mote_id)?;
    }
    if let ReplyData::MoteStatus(status) = get(session, GetParameter::MoteStatus, timeout)? {
        writeln!(out, "state         : {}", state_name(status.state))?;
        writeln!(out, "parents       : {}", status.num_parents)?;
    }
    Ok(())
}

/// Print one parameter, named as in the mote API (`networkId`, `moteInfo`, ...).
pub fn get_param<T: ByteTransport>(
    session: &mut Session<T>,
    name: &str,
    timeout: Duration,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let param =
        GetParameter::from_name(name).ok_or_else(|| anyhow!("unknown parameter '{}'", name))?;
    let data = get(session, param, timeout)?;
    writeln!(out, "{:#?}", data)?;
    Ok(())
}

pub fn set_network_id<T: ByteTransport>(
    session: &mut Session<T>,
    network_id: u16,
    timeout: Duration,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    call(
        session,
        &Command::SetParameter(SetParameter::NetworkId(network_id)),
        timeout,
    )?;
    writeln!(out, "network id set to {}", network_id)?;
    Ok(())
}

/// Start joining and report events until the mote is operational or the
/// timeout passes.
pub fn join<T: ByteTransport>(
    session: &mut Session<T>,
    timeout: Duration,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    call(session, &Command::Join, timeout)?;
    writeln!(out, "join started")?;

    while let Some(received) = session.next_notification(timeout)? {
        print_notification(out, &received)?;
        if let Notification::Events(ev) = received.notification {
            if ev.state == MOTE_STATE_OPERATIONAL {
                writeln!(out, "mote is operational")?;
                return Ok(());
            }
        }
    }
    bail!("mote did not become operational within {:?}", timeout)
}

/// Open and bind a socket, send one packet to the manager, then close.
pub fn send<T: ByteTransport>(
    session: &mut Session<T>,
    payload: Vec<u8>,
    port: u16,
    timeout: Duration,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let socket_id = match call(session, &Command::OpenSocket { protocol: 0 }, timeout)? {
        ReplyData::OpenSocket { socket_id } => socket_id,
        other => bail!("unexpected openSocket reply {:?}", other),
    };
    debug!(socket_id, "socket opened");

    let result = send_on_socket(session, socket_id, payload, port, timeout, out);
    call(session, &Command::CloseSocket { socket_id }, timeout)?;
    result
}

fn send_on_socket<T: ByteTransport>(
    session: &mut Session<T>,
    socket_id: u8,
    payload: Vec<u8>,
    port: u16,
    timeout: Duration,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    call(
        session,
        &Command::BindSocket(BindSocketArgs { socket_id, port }),
        timeout,
    )?;

    let packet_id = 1;
    call(
        session,
        &Command::SendTo(SendToArgs {
            socket_id,
            dest_ip: IPV6_ADDR_MANAGER,
            dest_port: MANAGER_PORT,
            service_type: 0,
            priority: 1,
            packet_id,
            payload,
        }),
        timeout,
    )?;

    while let Some(received) = session.next_notification(timeout)? {
        if let Notification::TxDone(done) = &received.notification {
            if done.packet_id == packet_id {
                writeln!(out, "packet {} sent, status {}", done.packet_id, done.status)?;
                return Ok(());
            }
        }
        print_notification(out, &received)?;
    }
    bail!("no txDone for packet {} within {:?}", packet_id, timeout)
}

/// Print notifications until `count` have been seen, or forever.
pub fn listen<T: ByteTransport>(
    session: &mut Session<T>,
    count: Option<usize>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut seen = 0;
    while count.map_or(true, |limit| seen < limit) {
        if let Some(received) = session.next_notification(Duration::from_secs(1))? {
            print_notification(out, &received)?;
            out.flush()?;
            seen += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipmt_sim::{SimulatedMote, ThreadedMote};

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_info_prints_identity() {
        let (_mote, mut session) =
            ThreadedMote::spawn(SimulatedMote::default(), LinkConfig::default());
        let mut out = Vec::new();
        info(&mut session, TIMEOUT, &mut out).unwrap();
        let out = text(out);
        assert!(out.contains("00-17-0d-00-00-38-06-8c"));
        assert!(out.contains("network id    : 1229"));
        assert!(out.contains("state         : idle"));
    }

    #[test]
    fn test_set_then_get_network_id() {
        let (_mote, mut session) =
            ThreadedMote::spawn(SimulatedMote::default(), LinkConfig::default());
        let mut out = Vec::new();
        set_network_id(&mut session, 300, TIMEOUT, &mut out).unwrap();
        get_param(&mut session, "networkid", TIMEOUT, &mut out).unwrap();
        assert!(text(out).contains("NetworkId(\n    300,\n)"));
    }

    #[test]
    fn test_unknown_parameter() {
        let (_mote, mut session) =
            ThreadedMote::spawn(SimulatedMote::default(), LinkConfig::default());
        let err = get_param(&mut session, "bogus", TIMEOUT, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("unknown parameter"));
    }

    #[test]
    fn test_join_then_send() {
        let (mote, mut session) =
            ThreadedMote::spawn(SimulatedMote::default(), LinkConfig::default());
        let mut out = Vec::new();
        join(&mut session, TIMEOUT, &mut out).unwrap();
        send(&mut session, b"hi".to_vec(), 60000, TIMEOUT, &mut out).unwrap();

        let out = text(out);
        assert!(out.contains("mote is operational"));
        assert!(out.contains("packet 1 sent, status 0"));
        assert!(mote.with_mote(|m| m
            .requests()
            .iter()
            .any(|c| matches!(c, Command::CloseSocket { .. }))));
    }

    #[test]
    fn test_send_before_join_is_refused() {
        let (_mote, mut session) =
            ThreadedMote::spawn(SimulatedMote::default(), LinkConfig::default());
        let err = send(&mut session, vec![1], 60000, TIMEOUT, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("sendTo returned invalid state"), "{}", err);
    }

    #[test]
    fn test_request_timeout_is_reported() {
        let (mote, mut session) =
            ThreadedMote::spawn(SimulatedMote::default(), LinkConfig::default());
        mote.with_mote(|m| m.set_auto_reply(false));
        let err = info(&mut session, Duration::from_millis(50), &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("getParameter.moteInfo failed"));
    }
}
