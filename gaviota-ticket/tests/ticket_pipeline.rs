//! End-to-end pipeline tests: template model + data record through the
//! merge engine, line renderer, and print session manager against a
//! scripted device driver.

use async_trait::async_trait;
use gaviota_printer::{
    CutMode, DeviceDriver, DeviceStatus, PrintCommand, PrintError, PrintResult,
    PrintSessionManager,
};
use gaviota_ticket::{DataRecord, TicketModel, TicketPrintService};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

const PHOTO_TICKET_MODEL: &str = r#"[
    {"key": "logo", "type": "image"},
    {"key": "empty_line", "type": "empty", "feed": 1},
    {"key": "straight_line", "type": "separator", "token": "=", "bold": true},
    {"key": "message", "type": "simple_text", "align": "center", "bold": true},
    {"key": "straight_line", "type": "separator", "token": "=", "bold": true},
    {"key": "products", "type": "multi_column_text", "multiline": true,
     "margin": 1, "right_margin": 1},
    {"key": "straight_line", "type": "separator", "token": "=", "bold": true},
    {"key": "footer", "type": "simple_text", "align": "center"}
]"#;

/// Records every buffer that reaches `send`, with a concurrency probe
#[derive(Default)]
struct DeviceLog {
    sent: Mutex<Vec<Vec<PrintCommand>>>,
    in_session: AtomicUsize,
    max_in_session: AtomicUsize,
}

struct ScriptedDriver {
    log: Arc<DeviceLog>,
    buffer: Vec<PrintCommand>,
    failing_connects: usize,
    finished: bool,
}

impl ScriptedDriver {
    fn new(log: Arc<DeviceLog>) -> Self {
        Self {
            log,
            buffer: Vec::new(),
            failing_connects: 0,
            finished: false,
        }
    }

    fn failing_first_connect(mut self) -> Self {
        self.failing_connects = 1;
        self
    }
}

#[async_trait]
impl DeviceDriver for ScriptedDriver {
    async fn connect(&mut self, target: &str) -> PrintResult<()> {
        if self.failing_connects > 0 {
            self.failing_connects -= 1;
            return Err(PrintError::Connection(target.to_string()));
        }
        let now = self.log.in_session.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.max_in_session.fetch_max(now, Ordering::SeqCst);
        // Let other submissions race in while the device is "busy"
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn begin_transaction(&mut self) -> PrintResult<()> {
        Ok(())
    }

    fn append_command(&mut self, command: &PrintCommand) -> PrintResult<()> {
        self.buffer.push(command.clone());
        Ok(())
    }

    async fn status(&mut self) -> PrintResult<DeviceStatus> {
        Ok(DeviceStatus {
            connection: true,
            online: true,
        })
    }

    async fn send(&mut self) -> PrintResult<()> {
        self.log.sent.lock().unwrap().push(self.buffer.clone());
        self.finished = true;
        Ok(())
    }

    async fn wait_job_finished(&mut self) -> PrintResult<()> {
        if self.finished {
            self.finished = false;
            Ok(())
        } else {
            Err(PrintError::Protocol("no job in flight".to_string()))
        }
    }

    async fn end_transaction(&mut self) -> PrintResult<()> {
        Ok(())
    }

    async fn disconnect(&mut self) -> PrintResult<()> {
        let _ = self
            .log
            .in_session
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        Ok(())
    }

    fn clear_buffer(&mut self) {
        self.buffer.clear();
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

fn photo_ticket_data() -> DataRecord {
    let mut data = DataRecord::new();
    data.insert_image("logo", image::DynamicImage::new_rgba8(200, 100))
        .insert_text("empty_line", "on")
        .insert_text("straight_line", "on")
        .insert_text("message", "Merry Christmas")
        .insert_rows(
            "products",
            vec![vec![
                "1".to_string(),
                "Souvenir photo print".to_string(),
                "5.00".to_string(),
                "5.00".to_string(),
            ]],
        );
    // "footer" is intentionally absent
    data
}

fn service_over(driver: ScriptedDriver) -> TicketPrintService {
    TicketPrintService::new(Arc::new(PrintSessionManager::new(Box::new(driver))))
}

fn callback() -> (gaviota_printer::JobCallback, oneshot::Receiver<bool>) {
    let (tx, rx) = oneshot::channel();
    (
        Box::new(move |success| {
            let _ = tx.send(success);
        }),
        rx,
    )
}

#[tokio::test]
async fn full_ticket_reaches_device_in_order() {
    init_tracing();
    let log = Arc::new(DeviceLog::default());
    let service = service_over(ScriptedDriver::new(log.clone()));

    let model = TicketModel::from_json(PHOTO_TICKET_MODEL).unwrap();
    let (cb, rx) = callback();
    let diagnostics = service
        .print_ticket("TCP:10.0.0.9", &model, &photo_ticket_data(), false, Some(cb))
        .unwrap();

    assert!(diagnostics.is_empty());
    assert!(rx.await.unwrap());

    let sent = log.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let buffer = &sent[0];

    // The image leads, the greeting follows, the job trailer closes
    let image_at = buffer
        .iter()
        .position(|c| matches!(c, PrintCommand::AddImage { .. }))
        .expect("image command");
    let greeting_at = buffer
        .iter()
        .position(|c| matches!(c, PrintCommand::AppendText(t) if t == "Merry Christmas"))
        .expect("greeting command");
    assert!(image_at < greeting_at);

    assert_eq!(
        &buffer[buffer.len() - 2..],
        &[
            PrintCommand::FeedLines(3),
            PrintCommand::Cut(CutMode::Full)
        ]
    );

    // The absent footer printed nothing, and the two separators around
    // the missing section never doubled up
    let separators: Vec<usize> = buffer
        .iter()
        .enumerate()
        .filter_map(|(i, c)| match c {
            PrintCommand::AppendText(t) if t.starts_with("==") => Some(i),
            _ => None,
        })
        .collect();
    assert_eq!(separators.len(), 3);
}

#[tokio::test]
async fn shape_mismatch_surfaces_but_ticket_still_prints() {
    init_tracing();
    let log = Arc::new(DeviceLog::default());
    let service = service_over(ScriptedDriver::new(log.clone()));

    let model = TicketModel::from_json(PHOTO_TICKET_MODEL).unwrap();
    let mut data = photo_ticket_data();
    // rows where the model expects an image
    data.insert_rows("logo", vec![vec!["oops".to_string()]]);

    let (cb, rx) = callback();
    let diagnostics = service
        .print_ticket("TCP:10.0.0.9", &model, &data, false, Some(cb))
        .unwrap();

    assert_eq!(diagnostics.len(), 1);
    assert!(rx.await.unwrap());
    assert_eq!(log.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn parallel_tickets_serialize_on_the_device() {
    init_tracing();
    let log = Arc::new(DeviceLog::default());
    let service = Arc::new(service_over(ScriptedDriver::new(log.clone())));
    let model = Arc::new(TicketModel::from_json(PHOTO_TICKET_MODEL).unwrap());

    let mut receivers = Vec::new();
    for _ in 0..6 {
        let service = service.clone();
        let model = model.clone();
        let (cb, rx) = callback();
        receivers.push(rx);
        tokio::spawn(async move {
            service
                .print_ticket(
                    "TCP:10.0.0.9",
                    &model,
                    &photo_ticket_data(),
                    false,
                    Some(cb),
                )
                .unwrap();
        });
    }

    for rx in receivers {
        assert!(rx.await.unwrap());
    }
    assert_eq!(log.sent.lock().unwrap().len(), 6);
    assert_eq!(log.max_in_session.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_connect_does_not_wedge_the_queue() {
    init_tracing();
    let log = Arc::new(DeviceLog::default());
    let service = service_over(ScriptedDriver::new(log.clone()).failing_first_connect());
    let model = TicketModel::from_json(PHOTO_TICKET_MODEL).unwrap();

    let (cb1, rx1) = callback();
    let (cb2, rx2) = callback();
    service
        .print_ticket("TCP:10.0.0.9", &model, &photo_ticket_data(), false, Some(cb1))
        .unwrap();
    service
        .print_ticket("TCP:10.0.0.9", &model, &photo_ticket_data(), false, Some(cb2))
        .unwrap();

    assert!(!rx1.await.unwrap());
    assert!(rx2.await.unwrap());
    assert_eq!(log.sent.lock().unwrap().len(), 1);
}
