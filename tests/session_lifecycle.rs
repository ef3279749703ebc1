//! Integration tests for the session lifecycle.
//!
//! Drives `SerialSession` end-to-end through the injected `MockRunner` and
//! `MockStream` collaborators (no hardware, no real `stty`), plus a
//! tempfile-backed round trip through the real `FileStream`.

use pretty_assertions::assert_eq;
use std::time::Duration;
use ttyline::{
    FlushOutcome, MockRunner, MockStream, SerialSession, SessionError, SessionState,
    LINE_TERMINATOR,
};

const NO_WAIT: Duration = Duration::ZERO;

fn configured_session() -> (SerialSession, MockRunner) {
    let runner = MockRunner::new();
    let mut session = SerialSession::with_runner(Box::new(runner.clone()));
    session.configure("/dev/ttyUSB0").expect("configure");
    (session, runner)
}

fn open_session() -> (SerialSession, MockStream, MockRunner) {
    let (mut session, runner) = configured_session();
    let stream = MockStream::new("/dev/ttyUSB0");
    session
        .open_with("r+b", Box::new(stream.clone()))
        .expect("open");
    (session, stream, runner)
}

// ============================================================================
// State machine
// ============================================================================

#[test]
fn open_before_configure_fails_for_any_path() {
    let mut session = SerialSession::with_runner(Box::new(MockRunner::new()));
    assert_eq!(session.state(), SessionState::Unconfigured);

    let err = session.open("r+b").unwrap_err();
    assert!(matches!(err, SessionError::NotConfigured));

    // The mode token is irrelevant while unconfigured; so is any would-be path.
    let err = session
        .open_with("r", Box::new(MockStream::new("MOCK")))
        .unwrap_err();
    assert!(matches!(err, SessionError::NotConfigured));
}

#[test]
fn configure_while_open_fails() {
    let (mut session, _stream, _runner) = open_session();

    let err = session.configure("/dev/ttyUSB1").unwrap_err();
    assert!(matches!(err, SessionError::AlreadyOpen));
    // The original device stays configured.
    assert_eq!(session.device_path(), Some("/dev/ttyUSB0"));
}

#[test]
fn configure_is_repeatable_while_configured() {
    let (mut session, runner) = configured_session();
    session.configure("/dev/ttyUSB1").expect("reconfigure");

    assert_eq!(session.device_path(), Some("/dev/ttyUSB1"));
    assert_eq!(session.state(), SessionState::Configured);
    // Two invocations per configure: probe, then -echo.
    assert_eq!(runner.calls().len(), 4);
}

#[test]
fn configure_after_close_is_rejected() {
    let (mut session, _stream, _runner) = open_session();
    assert!(session.close());
    assert_eq!(session.state(), SessionState::Closed);

    let err = session.configure("/dev/ttyUSB0").unwrap_err();
    assert!(matches!(err, SessionError::SessionClosed));
}

#[test]
fn configure_runs_probe_then_echo_disable() {
    let (_session, runner) = configured_session();

    let calls = runner.calls();
    assert_eq!(
        calls,
        vec![
            vec!["stty", "-F", "/dev/ttyUSB0"],
            vec!["stty", "-F", "/dev/ttyUSB0", "-echo"],
        ]
    );
}

#[test]
fn failed_probe_leaves_session_unconfigured() {
    let runner = MockRunner::new();
    runner.push_exit(1, "stty: /dev/nope: No such file or directory");
    let mut session = SerialSession::with_runner(Box::new(runner.clone()));

    let err = session.configure("/dev/nope").unwrap_err();
    assert!(matches!(err, SessionError::InvalidDevice(_)));
    assert_eq!(session.state(), SessionState::Unconfigured);
    assert_eq!(session.device_path(), None);
    // The -echo call never happened.
    assert_eq!(runner.calls().len(), 1);
}

#[test]
fn open_twice_is_a_noop() {
    let (mut session, stream, _runner) = open_session();

    session.open("r+b").expect("second open is a no-op");
    assert_eq!(session.state(), SessionState::Open);

    // Still the same stream underneath.
    session.send_with_wait("AT", NO_WAIT);
    assert_eq!(stream.write_log().len(), 1);
}

#[test]
fn open_rejects_invalid_mode_tokens() {
    let (mut session, _runner) = configured_session();

    for token in ["rw", "x", "", "r++", "b"] {
        let err = session
            .open_with(token, Box::new(MockStream::new("MOCK")))
            .unwrap_err();
        assert!(
            matches!(err, SessionError::InvalidMode(ref t) if t == token),
            "token {token:?} should be rejected"
        );
    }
    assert_eq!(session.state(), SessionState::Configured);
}

#[test]
fn open_surfaces_stream_failure_as_port_open() {
    let runner = MockRunner::new();
    let mut session = SerialSession::with_runner(Box::new(runner));
    session
        .configure("/definitely/not/a/device")
        .expect("mock probe accepts anything");

    let err = session.open("r+b").unwrap_err();
    match err {
        SessionError::PortOpen { path, .. } => {
            assert_eq!(path, "/definitely/not/a/device");
        }
        other => panic!("expected PortOpen, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Configured);
}

// ============================================================================
// Close semantics
// ============================================================================

#[test]
fn close_twice_succeeds_without_side_effects() {
    let (mut session, stream, _runner) = open_session();

    assert!(session.close());
    assert!(stream.was_closed());
    assert_eq!(session.state(), SessionState::Closed);

    // Second close: successful no-op.
    assert!(session.close());
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn close_before_open_is_a_successful_noop() {
    let mut session = SerialSession::with_runner(Box::new(MockRunner::new()));
    assert!(session.close());
    // No transition happened: still unconfigured, still usable.
    assert_eq!(session.state(), SessionState::Unconfigured);
    session.configure("/dev/ttyUSB0").expect("configure");
}

#[test]
fn refused_close_keeps_session_open() {
    let (mut session, mut stream, _runner) = open_session();
    stream.set_refuse_close(true);

    assert!(!session.close());
    assert_eq!(session.state(), SessionState::Open);
    assert!(!stream.was_closed());

    // Once the stream cooperates, close succeeds.
    stream.set_refuse_close(false);
    assert!(session.close());
    assert!(stream.was_closed());
}

#[test]
fn dropping_an_open_session_closes_the_stream() {
    let (session, stream, _runner) = open_session();
    assert!(!stream.was_closed());

    drop(session);
    assert!(stream.was_closed());
}

// ============================================================================
// Baud rate
// ============================================================================

#[test]
fn set_baud_rate_accepts_whitelisted_rates() {
    for rate in ttyline::baud::SUPPORTED_BAUD_RATES {
        let (mut session, runner) = configured_session();
        session.set_baud_rate(rate).expect("whitelisted rate");
        assert_eq!(
            runner.calls().last().unwrap(),
            &vec![
                "stty".to_string(),
                "-F".to_string(),
                "/dev/ttyUSB0".to_string(),
                rate.to_string()
            ]
        );
    }
}

#[test]
fn set_baud_rate_rejects_unlisted_rates_without_running_stty() {
    let (mut session, runner) = configured_session();
    let calls_before = runner.calls().len();

    for rate in [0, 75, 9601, 14400, 230400] {
        let err = session.set_baud_rate(rate).unwrap_err();
        assert!(matches!(err, SessionError::InvalidBaudRate(r) if r == rate));
    }
    assert_eq!(runner.calls().len(), calls_before);
}

#[test]
fn set_baud_rate_requires_configured_or_open() {
    let mut session = SerialSession::with_runner(Box::new(MockRunner::new()));
    let err = session.set_baud_rate(9600).unwrap_err();
    assert!(matches!(err, SessionError::NotConfigured));

    // Legal while open as well.
    let (mut session, _stream, _runner) = open_session();
    session.set_baud_rate(9600).expect("baud while open");
}

#[test]
fn set_baud_rate_carries_process_output_on_failure() {
    let (mut session, runner) = configured_session();
    runner.push_exit(1, "stty: invalid argument '115200'");

    let err = session.set_baud_rate(115200).unwrap_err();
    match err {
        SessionError::BaudRateSet { stderr, .. } => {
            assert!(stderr.contains("invalid argument"));
        }
        other => panic!("expected BaudRateSet, got {other:?}"),
    }
}

// ============================================================================
// Timeout attribute
// ============================================================================

#[test]
fn set_timeout_requires_open_port() {
    let (mut session, _runner) = configured_session();
    let err = session.set_timeout(Duration::from_secs(2)).unwrap_err();
    assert!(matches!(err, SessionError::PortNotOpen));
}

#[test]
fn set_timeout_stores_attribute_on_stream() {
    let (mut session, stream, _runner) = open_session();
    session
        .set_timeout(Duration::from_secs(2))
        .expect("set timeout");
    assert_eq!(stream.stored_timeout(), Some(Duration::from_secs(2)));
}

// ============================================================================
// Send / read exchange
// ============================================================================

#[test]
fn full_exchange_with_echo_filtering() {
    let (mut session, mut stream, _runner) = open_session();

    let outcome = session.send_with_wait("AT", NO_WAIT);
    assert_eq!(outcome, FlushOutcome::Flushed);
    assert_eq!(session.last_command(), Some("AT"));
    assert_eq!(session.pending_bytes(), 0);
    assert_eq!(
        stream.write_log(),
        vec![format!("AT{LINE_TERMINATOR}").into_bytes()]
    );

    stream.enqueue_read(b"AT\r\nOK\r\n");
    let reply = session
        .read_without_command(None)
        .expect("read")
        .expect("lines");
    assert_eq!(reply, vec!["OK".to_string()]);
}

#[test]
fn read_requires_open_port() {
    let (mut session, _runner) = configured_session();
    assert!(matches!(
        session.read(None),
        Err(SessionError::PortNotOpen)
    ));
    assert!(matches!(
        session.read_without_command(None),
        Err(SessionError::PortNotOpen)
    ));

    let mut closed = SerialSession::with_runner(Box::new(MockRunner::new()));
    closed.configure("/dev/ttyUSB0").expect("configure");
    closed
        .open_with("r+b", Box::new(MockStream::new("MOCK")))
        .expect("open");
    closed.close();
    assert!(matches!(closed.read(None), Err(SessionError::PortNotOpen)));
}

#[test]
fn read_default_passes_through_on_empty_stream() {
    let (mut session, _stream, _runner) = open_session();

    let default = vec!["nothing heard".to_string()];
    let result = session
        .read(None)
        .expect("read")
        .unwrap_or_else(|| default.clone());
    assert_eq!(result, default);
}

#[test]
fn counted_read_returns_short_data_not_default() {
    let (mut session, mut stream, _runner) = open_session();
    stream.enqueue_read(b"OK\n");

    // count=5 with only 3 bytes available: terminates on the short first
    // attempt and returns the data.
    let lines = session.read(Some(5)).expect("read").expect("lines");
    assert_eq!(lines, vec!["OK".to_string()]);
}

#[test]
fn multi_command_exchange_filters_only_latest_echo() {
    let (mut session, mut stream, _runner) = open_session();

    session.send_with_wait("AT", NO_WAIT);
    stream.enqueue_read(b"AT\r\nOK\r\n");
    assert_eq!(
        session.read_without_command(None).unwrap().unwrap(),
        vec!["OK".to_string()]
    );

    session.send_with_wait("AT+CSQ", NO_WAIT);
    stream.enqueue_read(b"AT+CSQ\r\n+CSQ: 21,0\r\nOK\r\n");
    assert_eq!(
        session.read_without_command(None).unwrap().unwrap(),
        vec!["+CSQ: 21,0".to_string(), "OK".to_string()]
    );

    assert_eq!(
        stream.write_log(),
        vec![
            format!("AT{LINE_TERMINATOR}").into_bytes(),
            format!("AT+CSQ{LINE_TERMINATOR}").into_bytes(),
        ]
    );
}

// ============================================================================
// FileStream round trip (no mocks on the stream side)
// ============================================================================

#[test]
fn file_backed_session_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fake-tty");
    std::fs::write(&path, b"AT\r\nOK\r\n").expect("seed response");
    let path = path.to_string_lossy().into_owned();

    let runner = MockRunner::new();
    let mut session = SerialSession::with_runner(Box::new(runner));
    session.configure(&path).expect("configure");
    session.open("r").expect("open backing file");

    session.send_with_wait("AT", NO_WAIT);
    let reply = session
        .read_without_command(None)
        .expect("read")
        .expect("lines");
    assert_eq!(reply, vec!["OK".to_string()]);

    assert!(session.close());
}

#[test]
fn file_backed_session_writes_terminated_commands() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fake-tty");
    std::fs::File::create(&path).expect("create backing file");
    let path = path.to_string_lossy().into_owned();

    let runner = MockRunner::new();
    let mut session = SerialSession::with_runner(Box::new(runner));
    session.configure(&path).expect("configure");
    session.open("w").expect("open backing file");

    assert_eq!(session.send_with_wait("AT", NO_WAIT), FlushOutcome::Flushed);
    assert!(session.close());

    let written = std::fs::read(&path).expect("read back");
    assert_eq!(written, format!("AT{LINE_TERMINATOR}").into_bytes());
}
