//! Background refresh orchestration.

use tokio::sync::mpsc;

use dirsnap_core::{DirectoryStructure, ScanError};

use crate::progress::{RefreshProgress, RefreshReport};
use crate::refresh::Refresher;

/// Queue capacity for refresh events. Progress events beyond a full queue
/// are dropped rather than blocking the scan thread.
const EVENT_CHANNEL_SIZE: usize = 256;

/// Events delivered while a background refresh runs.
#[derive(Debug)]
pub enum RefreshEvent {
    /// A directory visit at shallow depth.
    Progress(RefreshProgress),
    /// The refresh finished; ownership of the structure returns to the
    /// caller with its scan duration already recorded.
    Complete {
        structure: DirectoryStructure,
        report: RefreshReport,
    },
    /// The refresh hit a non-recoverable error. The structure comes back
    /// too, except when the scan thread itself died.
    Failed {
        structure: Option<DirectoryStructure>,
        error: ScanError,
    },
}

/// Run a refresh off the calling task.
///
/// The walk itself happens on a blocking worker; the caller consumes
/// [`RefreshEvent`]s from the returned channel. Any number of `Progress`
/// events is followed by exactly one terminal event (`Complete` or
/// `Failed`). Moving the structure in and back out means at most one
/// refresh can ever be in flight per structure.
pub fn start_refresh(
    mut structure: DirectoryStructure,
    refresher: Refresher,
) -> mpsc::Receiver<RefreshEvent> {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);

    tokio::spawn(async move {
        let (progress_tx, mut progress_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);

        // Forward progress from the scan thread to the caller.
        let tx_progress = tx.clone();
        let forward_task = tokio::spawn(async move {
            while let Some(progress) = progress_rx.recv().await {
                if tx_progress
                    .send(RefreshEvent::Progress(progress))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        // The walk is blocking filesystem work.
        let result = tokio::task::spawn_blocking(move || {
            let report = refresher.refresh(&mut structure, |path| {
                // try_send: a slow consumer loses progress events, but
                // never stalls the scan.
                let _ = progress_tx.try_send(RefreshProgress {
                    path: path.to_path_buf(),
                });
            });
            (structure, report)
        })
        .await;

        // The scan closure has dropped its sender by now, so the forwarder
        // drains whatever is queued and finishes before the terminal event.
        let _ = forward_task.await;

        let event = match result {
            Ok((structure, Ok(report))) => RefreshEvent::Complete { structure, report },
            Ok((structure, Err(error))) => RefreshEvent::Failed {
                structure: Some(structure),
                error,
            },
            Err(join_error) => RefreshEvent::Failed {
                structure: None,
                error: ScanError::Other {
                    message: join_error.to_string(),
                },
            },
        };
        let _ = tx.send(event).await;
    });

    rx
}
