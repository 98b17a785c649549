use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use tracing::debug;

use super::{VerificationResult, Verifier};
use crate::mx::LookupMx;
use crate::smtp_verify::MailboxProber;

impl<R, P> Verifier<R, P>
where
    R: LookupMx + Sync,
    P: MailboxProber + Sync,
{
    /// Verifies `addresses` on at most `workers` threads and returns the
    /// results in input order. Each worker holds at most one SMTP
    /// connection at a time.
    pub fn verify_batch<S>(&self, addresses: &[S], workers: usize) -> Vec<VerificationResult>
    where
        S: AsRef<str> + Sync,
    {
        if addresses.is_empty() {
            return Vec::new();
        }
        let workers = workers.clamp(1, addresses.len());
        debug!(count = addresses.len(), workers, "batch verification started");

        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel();
        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move || {
                    loop {
                        let idx = next.fetch_add(1, Ordering::Relaxed);
                        let Some(address) = addresses.get(idx) else {
                            break;
                        };
                        let result = self.verify(address.as_ref());
                        if tx.send((idx, result)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(tx);

        let mut slots: Vec<Option<VerificationResult>> = addresses.iter().map(|_| None).collect();
        for (idx, result) in rx {
            slots[idx] = Some(result);
        }
        // scope joined every worker, so every slot is filled
        slots.into_iter().flatten().collect()
    }
}
