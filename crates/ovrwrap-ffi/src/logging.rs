//! Runtime log messages, forwarded to the caller's legacy callback.
//!
//! The runtime is always given [`forward`]. Each message becomes a `tracing`
//! event and is then handed to whatever callback the caller registered at
//! initialization, in the signature its revision expects.
//!
//! The caller's callback may call back into the API. While the current
//! thread holds the shim state, messages are queued and delivered only once
//! the state is released.

use std::cell::{Cell, RefCell};
use std::ffi::{c_char, c_int, CStr, CString};
use std::sync::{Mutex, MutexGuard};

use ovrwrap_rev::sys::RevLogCallback;
use tracing::{debug, error, info};

use crate::legacy::{LogCallback, LogCallbackV5};

const LOG_LEVEL_DEBUG: c_int = 0;
const LOG_LEVEL_INFO: c_int = 1;

#[derive(Clone, Copy)]
enum LegacySink {
    /// 0.5 and 0.6: no user data.
    Plain(unsafe extern "C" fn(c_int, *const c_char)),
    WithUserData(unsafe extern "C" fn(usize, c_int, *const c_char), usize),
}

static SINK: Mutex<Option<LegacySink>> = Mutex::new(None);

thread_local! {
    static HOLDS: Cell<usize> = const { Cell::new(0) };
    static PENDING: RefCell<Vec<(c_int, CString)>> = const { RefCell::new(Vec::new()) };
}

fn sink() -> MutexGuard<'static, Option<LegacySink>> {
    match SINK.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub fn install_v5(callback: LogCallbackV5) {
    *sink() = callback.map(LegacySink::Plain);
}

pub fn install(callback: LogCallback, user_data: usize) {
    *sink() = callback.map(|callback| LegacySink::WithUserData(callback, user_data));
}

pub fn clear() {
    *sink() = None;
}

/// Marks the current thread as holding the shim state. Dropping it
/// delivers whatever was queued meanwhile.
pub struct Deferral(());

impl Deferral {
    pub fn hold() -> Self {
        HOLDS.with(|holds| holds.set(holds.get() + 1));
        Self(())
    }
}

impl Drop for Deferral {
    fn drop(&mut self) {
        let outermost = HOLDS.with(|holds| {
            let remaining = holds.get().saturating_sub(1);
            holds.set(remaining);
            remaining == 0
        });
        if !outermost {
            return;
        }
        let pending = PENDING.with(|pending| std::mem::take(&mut *pending.borrow_mut()));
        for (level, message) in pending {
            deliver(level, message.as_ptr());
        }
    }
}

fn deliver(level: c_int, message: *const c_char) {
    // Copy out so the caller's callback runs without the lock held.
    let target = *sink();
    // SAFETY: the callback was registered by the caller for exactly this
    // signature, and `message` is a live NUL-terminated string.
    unsafe {
        match target {
            Some(LegacySink::Plain(callback)) => callback(level, message),
            Some(LegacySink::WithUserData(callback, user_data)) => {
                callback(user_data, level, message)
            }
            None => {}
        }
    }
}

/// The callback registered with the runtime.
pub fn runtime_callback() -> RevLogCallback {
    Some(forward)
}

/// # Safety
/// `message` must be null or a NUL-terminated string valid for the call.
pub unsafe extern "C" fn forward(_user_data: usize, level: c_int, message: *const c_char) {
    if message.is_null() {
        return;
    }
    let text = CStr::from_ptr(message);
    let lossy = text.to_string_lossy();
    match level {
        LOG_LEVEL_DEBUG => debug!(target: "ovrwrap::runtime", "{lossy}"),
        LOG_LEVEL_INFO => info!(target: "ovrwrap::runtime", "{lossy}"),
        _ => error!(target: "ovrwrap::runtime", "{lossy}"),
    }

    if HOLDS.with(Cell::get) > 0 {
        PENDING.with(|pending| pending.borrow_mut().push((level, text.to_owned())));
    } else {
        deliver(level, message);
    }
}
