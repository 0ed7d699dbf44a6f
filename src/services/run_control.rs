use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct RunControl {
    running: AtomicBool,
    cancel: std::sync::Mutex<Option<CancelToken>>,
}

pub struct RunGuard<'a> {
    control: &'a RunControl,
    pub token: CancelToken,
}

impl RunControl {
    pub fn try_start(&self) -> Option<RunGuard<'_>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }

        let token = CancelToken::default();
        *self.lock_cancel() = Some(token.clone());

        Some(RunGuard {
            control: self,
            token,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) -> bool {
        match self.lock_cancel().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn lock_cancel(&self) -> std::sync::MutexGuard<'_, Option<CancelToken>> {
        match self.cancel.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.control.lock_cancel() = None;
        self.control.running.store(false, Ordering::SeqCst);
    }
}
