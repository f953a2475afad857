//! Windows keyboard capture via Raw Input (`WM_INPUT`).
//!
//! `RawInputCapture` implements `KeyboardCapture`. `start()` spawns a named
//! background thread that creates a message-only window, registers it for raw
//! keyboard input and runs a `GetMessageW` loop. `start()` blocks until the
//! thread reports either its thread id (registration succeeded) or the error
//! that stopped it. `stop()` posts `WM_QUIT` to that thread id and joins.
//!
//! Callback storage: the window procedure receives no user pointer, so the
//! callback is moved into the worker thread and kept in a thread-local. It is
//! only ever invoked on that thread and is dropped when the loop exits.
//!
//! Raw input registration is per process: while several captures can run,
//! only the most recently registered window receives keyboard input, and a
//! capture that exits removes the registration for all of them.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use windows_sys::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows_sys::Win32::System::Threading::GetCurrentThreadId;
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{MapVirtualKeyW, MAPVK_VSC_TO_VK_EX};
use windows_sys::Win32::UI::Input::{
    GetRawInputData, HRAWINPUT, RAWINPUTHEADER, RAWKEYBOARD, RID_INPUT, RIM_TYPEKEYBOARD,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    DefWindowProcW, DispatchMessageW, GetMessageW, PostThreadMessageW, TranslateMessage, MSG,
    WM_INPUT, WM_QUIT,
};

use super::window::{MessageWindow, WindowClass};
use crate::config::HookConfig;
use crate::decode::{decode_keyboard, KeyEvent, RawKeyboard};
use crate::keys::describe_vk;
use crate::platform::{KeyCallback, KeyboardCapture, PlatformError};

thread_local! {
    /// Callback of the capture running on this thread, if any.
    static KEY_CALLBACK: RefCell<Option<KeyCallback>> = RefCell::new(None);
}

// ---------------------------------------------------------------------------
// Public struct
// ---------------------------------------------------------------------------

/// Windows keyboard capture backend using Raw Input.
pub struct RawInputCapture {
    config: HookConfig,
    /// Thread ID of the background message-loop thread; used for `PostThreadMessageW`.
    thread_id: u32,
    thread: Option<JoinHandle<()>>,
}

impl RawInputCapture {
    pub fn new(config: HookConfig) -> Self {
        Self {
            config,
            thread_id: 0,
            thread: None,
        }
    }
}

// ---------------------------------------------------------------------------
// KeyboardCapture trait impl
// ---------------------------------------------------------------------------

impl KeyboardCapture for RawInputCapture {
    fn start(&mut self, callback: KeyCallback) -> Result<(), PlatformError> {
        self.stop()?;
        // Checked again here for captures built from a hand-made HookConfig.
        self.config.validate()?;

        // Background thread sends its id once raw input is registered.
        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, PlatformError>>();
        let config = self.config.clone();

        let thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run_message_loop(config, callback, ready_tx))
            .map_err(PlatformError::Spawn)?;

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                self.thread_id = thread_id;
                self.thread = Some(thread);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(PlatformError::ThreadExited)
            }
        }
    }

    fn stop(&mut self) -> Result<(), PlatformError> {
        // Signal the message loop to exit.
        if self.thread_id != 0 {
            let posted = unsafe { PostThreadMessageW(self.thread_id, WM_QUIT, 0, 0) };
            if posted == 0 {
                log::warn!("capture: PostThreadMessageW failed, thread may already be gone");
            }
            self.thread_id = 0;
        }

        if let Some(t) = self.thread.take() {
            if t.join().is_err() {
                log::error!("capture: message loop thread panicked");
            }
        }

        Ok(())
    }

    /// False once the loop has exited, even before `stop` joins it
    /// (`GetMessageW` failing ends the loop on its own).
    fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for RawInputCapture {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

// ---------------------------------------------------------------------------
// Worker thread
// ---------------------------------------------------------------------------

/// Body of the capture thread. Reports readiness through `ready`, then pumps
/// messages until `WM_QUIT`.
fn run_message_loop(
    config: HookConfig,
    callback: KeyCallback,
    ready: Sender<Result<u32, PlatformError>>,
) {
    let (class, window) = match open_raw_input_window(&config) {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    KEY_CALLBACK.with(|slot| *slot.borrow_mut() = Some(callback));

    let thread_id = unsafe { GetCurrentThreadId() };
    let _ = ready.send(Ok(thread_id));

    log::info!("capture: raw keyboard input registered (thread {thread_id})");

    // Returns 0 on WM_QUIT, -1 on error; both exit the loop.
    unsafe {
        let mut msg: MSG = std::mem::zeroed();
        while GetMessageW(&mut msg, ptr::null_mut(), 0, 0) > 0 {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    window.unregister_raw_keyboard();
    KEY_CALLBACK.with(|slot| slot.borrow_mut().take());
    drop(window);
    drop(class);

    log::info!("capture: message loop exited");
}

fn open_raw_input_window(
    config: &HookConfig,
) -> Result<(WindowClass, MessageWindow), PlatformError> {
    let class = WindowClass::register(&config.window_class, Some(window_proc))?;
    let window = MessageWindow::create(&class)?;
    window.register_raw_keyboard()?;
    Ok((class, window))
}

// ---------------------------------------------------------------------------
// Window procedure
// ---------------------------------------------------------------------------

/// Handles `WM_INPUT` on the capture thread; everything else goes to
/// `DefWindowProcW`, which also releases the raw input buffer.
unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_INPUT {
        if let Some(raw) = read_raw_keyboard(lparam as HRAWINPUT) {
            dispatch(decode_keyboard(raw, resolve_scan_code));
        }
    }
    DefWindowProcW(hwnd, msg, wparam, lparam)
}

/// Copies the keyboard record out of a `WM_INPUT` payload. `None` for
/// non-keyboard input and for reads that come back short.
unsafe fn read_raw_keyboard(handle: HRAWINPUT) -> Option<RawKeyboard> {
    let header_size = std::mem::size_of::<RAWINPUTHEADER>();

    let mut size: u32 = 0;
    let r0 = GetRawInputData(
        handle,
        RID_INPUT,
        ptr::null_mut(),
        &mut size,
        header_size as u32,
    );
    if r0 == u32::MAX || size == 0 {
        return None;
    }

    let mut buf = vec![0u8; size as usize];
    let copied = GetRawInputData(
        handle,
        RID_INPUT,
        buf.as_mut_ptr().cast(),
        &mut size,
        header_size as u32,
    );
    if copied != size {
        return None;
    }

    // The byte buffer carries no alignment guarantee; read fields unaligned.
    let header: RAWINPUTHEADER = ptr::read_unaligned(buf.as_ptr().cast());
    if header.dwType != RIM_TYPEKEYBOARD {
        return None;
    }
    if buf.len() < header_size + std::mem::size_of::<RAWKEYBOARD>() {
        return None;
    }
    let kb: RAWKEYBOARD = ptr::read_unaligned(buf.as_ptr().add(header_size).cast());

    Some(RawKeyboard {
        make_code: kb.MakeCode,
        flags: kb.Flags,
        vkey: kb.VKey,
    })
}

fn resolve_scan_code(scan_code: u16) -> u32 {
    unsafe { MapVirtualKeyW(scan_code as u32, MAPVK_VSC_TO_VK_EX) }
}

/// Hands `event` to this thread's callback. A panicking callback is logged
/// and swallowed; unwinding out of `window_proc` would abort the host.
fn dispatch(event: KeyEvent) {
    log::debug!(
        "capture: key {} {:?} (scan {:#06x})",
        describe_vk(event.vk),
        event.state,
        event.scan_code
    );
    KEY_CALLBACK.with(|slot| {
        if let Some(cb) = slot.borrow().as_ref() {
            if panic::catch_unwind(AssertUnwindSafe(|| cb(event))).is_err() {
                log::error!("capture: key callback panicked");
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::RecvTimeoutError;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use std::time::Duration;

    use crate::decode::KeyState;

    /// Raw input registration is process-wide, so live captures take turns.
    static LIVE_CAPTURE: Mutex<()> = Mutex::new(());

    fn live_capture_guard() -> MutexGuard<'static, ()> {
        LIVE_CAPTURE.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn test_config(window_class: &str) -> HookConfig {
        HookConfig {
            thread_name: "NativeInput test capture".into(),
            window_class: window_class.into(),
        }
    }

    fn key_a() -> KeyEvent {
        KeyEvent {
            vk: 0x41,
            scan_code: 0x1E,
            state: KeyState::Down,
        }
    }

    #[test]
    fn new_produces_idle_state() {
        let capture = RawInputCapture::new(HookConfig::default());
        assert_eq!(capture.thread_id, 0);
        assert!(capture.thread.is_none());
        assert!(!capture.is_running());
    }

    /// Stopping a capture that was never started must return Ok and not panic.
    #[test]
    fn stop_on_unstarted_capture_is_noop() {
        let mut capture = RawInputCapture::new(HookConfig::default());
        assert!(capture.stop().is_ok());
        assert!(capture.stop().is_ok());
    }

    #[test]
    fn start_runs_until_stop_joins() {
        let _guard = live_capture_guard();
        let mut capture = RawInputCapture::new(test_config("NativeInputTestStart"));

        capture.start(Box::new(|_: KeyEvent| {})).unwrap();
        assert!(capture.is_running());
        assert_ne!(capture.thread_id, 0);

        capture.stop().unwrap();
        assert!(!capture.is_running());
        assert!(capture.thread.is_none());
        assert_eq!(capture.thread_id, 0);
    }

    #[test]
    fn restart_reuses_class_and_replaces_thread() {
        let _guard = live_capture_guard();
        let mut capture = RawInputCapture::new(test_config("NativeInputTestRestart"));

        capture.start(Box::new(|_: KeyEvent| {})).unwrap();
        capture.start(Box::new(|_: KeyEvent| {})).unwrap();
        assert!(capture.is_running());

        capture.stop().unwrap();
        capture.start(Box::new(|_: KeyEvent| {})).unwrap();
        assert!(capture.is_running());
        capture.stop().unwrap();
    }

    #[test]
    fn dropping_running_capture_stops_thread() {
        let _guard = live_capture_guard();
        let (tx, rx) = mpsc::channel::<KeyEvent>();
        let mut capture = RawInputCapture::new(test_config("NativeInputTestDropCapture"));
        capture
            .start(Box::new(move |event: KeyEvent| {
                let _ = tx.send(event);
            }))
            .unwrap();

        drop(capture);

        // The worker drops the callback, and with it the sender, on exit.
        loop {
            match rx.recv_timeout(Duration::from_secs(5)) {
                Ok(_) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => panic!("capture thread still alive after drop"),
            }
        }
    }

    #[test]
    fn nul_in_thread_name_fails_without_panicking() {
        let mut capture = RawInputCapture::new(HookConfig {
            thread_name: "NativeInput\0test".into(),
            ..HookConfig::default()
        });
        let result = capture.start(Box::new(|_: KeyEvent| {}));
        assert!(matches!(result, Err(PlatformError::InvalidConfig(_))));
        assert!(!capture.is_running());
    }

    #[test]
    fn finished_thread_is_not_running() {
        let handle = thread::spawn(|| {});
        while !handle.is_finished() {
            thread::yield_now();
        }
        let capture = RawInputCapture {
            config: HookConfig::default(),
            thread_id: 0,
            thread: Some(handle),
        };
        assert!(!capture.is_running());
    }

    #[test]
    fn dispatch_without_callback_is_noop() {
        dispatch(key_a());
    }

    #[test]
    fn panicking_callback_does_not_unwind_out_of_dispatch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        KEY_CALLBACK.with(|slot| {
            *slot.borrow_mut() = Some(Box::new(move |_: KeyEvent| {
                seen.fetch_add(1, Ordering::SeqCst);
                panic!("callback failure");
            }))
        });

        dispatch(key_a());
        dispatch(key_a());

        KEY_CALLBACK.with(|slot| slot.borrow_mut().take());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
