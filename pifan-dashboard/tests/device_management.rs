use pifan_dashboard::alerts::AlertLevel;
use pifan_dashboard::layout::Layout;
use pifan_dashboard::{Command, DeviceForm, DeviceKey, FleetError, RegistryError, ValidationError};
use pifan_devkit::{TestHarness, ViewOp};
use std::time::Duration;

fn key(address: &str) -> DeviceKey {
    DeviceKey::from_address(address)
}

#[tokio::test]
async fn test_add_reachable_device() {
    let mut h = TestHarness::with_devices(&[("Pi 1", "10.0.0.1", 10000)]);
    h.dashboard.start().await;
    h.set_online("10.0.0.5", 41.0, 30.0, 10.0, 20.0);

    h.dashboard.set_add_form(DeviceForm::new(" Garage ", "10.0.0.5", "10000"));
    let outcome = h.dashboard.add_device().await.unwrap();

    assert!(outcome.reachable);
    assert_eq!(outcome.device.name, "Garage");
    assert!(h.dashboard.add_form().is_empty());
    assert_eq!(h.fleet.records().len(), 2);

    let alert = h.dashboard.alert().unwrap();
    assert_eq!(alert.message, "Device added and reachable.");
    assert_eq!(alert.level, AlertLevel::Success);
    assert!(!alert.persistent);

    // le registre est rechargé avant la passe immédiate
    let calls = h.fleet.calls();
    assert_eq!(calls[calls.len() - 2..], ["add_pi".to_string(), "get_pi_list".to_string()]);
    assert_eq!(h.view.card_order(), vec![key("10.0.0.1"), key("10.0.0.5")]);
    assert_eq!(h.view.last_counters().map(|c| c.online), Some(1));
}

#[tokio::test]
async fn test_add_unreachable_device_is_flagged_once() {
    let mut h = TestHarness::new();
    h.dashboard.start().await;

    h.dashboard.set_add_form(DeviceForm::new("Shed", "10.0.0.6", "10000"));
    let outcome = h.dashboard.add_device().await.unwrap();
    assert!(!outcome.reachable);

    let alert = h.view.last_alert().unwrap();
    assert_eq!(alert.message, "Device added but not reachable (offline or status API unavailable).");
    assert_eq!(alert.level, AlertLevel::Warning);

    let list = h.view.last_device_list().unwrap();
    assert!(list[0].flagged);

    // le signalement est consommé : une fois en ligne, plus rien
    h.set_online("10.0.0.6", 41.0, 30.0, 10.0, 20.0);
    h.dashboard.refresh_now().await;
    h.dashboard.render_device_list();
    assert!(!h.view.last_device_list().unwrap()[0].flagged);
}

#[tokio::test]
async fn test_duplicate_address_keeps_form() {
    let mut h = TestHarness::with_devices(&[("Pi 1", "10.0.0.1", 10000)]);
    h.dashboard.start().await;

    let form = DeviceForm::new("Copy", "10.0.0.1", "10002");
    h.dashboard.set_add_form(form.clone());
    let err = h.dashboard.add_device().await.unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(h.dashboard.add_form(), &form);
    assert_eq!(h.fleet.records().len(), 1);

    let alert = h.dashboard.alert().unwrap();
    assert_eq!(alert.message, "That device address already exists.");
    assert_eq!(alert.level, AlertLevel::Danger);
    assert!(alert.persistent);
}

#[tokio::test]
async fn test_invalid_forms_send_nothing() {
    let mut h = TestHarness::new();
    h.dashboard.start().await;

    h.dashboard.set_add_form(DeviceForm::new("Pi", "", ""));
    let err = h.dashboard.add_device().await.unwrap_err();
    assert!(matches!(err, RegistryError::Validation(ValidationError::MissingFields(_))));
    assert_eq!(h.dashboard.alert().unwrap().message, "Please enter IP and port.");

    h.dashboard.set_add_form(DeviceForm::new("Pi", "10.0.0.7", "80"));
    let err = h.dashboard.add_device().await.unwrap_err();
    assert!(matches!(err, RegistryError::Validation(ValidationError::InvalidPort)));
    let alert = h.dashboard.alert().unwrap();
    assert_eq!(alert.message, "Port must be a number between 1024 and 65535.");
    assert!(alert.persistent);

    assert!(!h.fleet.calls().iter().any(|call| call == "add_pi"));
}

#[tokio::test]
async fn test_management_failure_aborts_add_only() {
    let mut h = TestHarness::new();
    h.dashboard.start().await;
    h.fleet.fail_next(500);

    h.dashboard.set_add_form(DeviceForm::new("Pi", "10.0.0.7", "10000"));
    let err = h.dashboard.add_device().await.unwrap_err();

    assert!(matches!(err, RegistryError::Fleet(FleetError::Status(500))));
    assert_eq!(h.dashboard.alert().unwrap().message, "Failed to add device due to an unexpected error.");
    assert!(!h.dashboard.add_form().is_empty());
    assert!(h.dashboard.registry().is_empty());
}

#[tokio::test]
async fn test_opening_edit_closes_previous_first() {
    let mut h = TestHarness::with_devices(&[("Pi 1", "10.0.0.1", 10000), ("Pi 2", "10.0.0.2", 10000)]);
    h.dashboard.start().await;
    h.view.take();

    h.dashboard.begin_edit("10.0.0.1").unwrap();
    h.dashboard.begin_edit("10.0.0.2").unwrap();

    let editor_ops: Vec<ViewOp> = h
        .view
        .take()
        .into_iter()
        .filter(|op| matches!(op, ViewOp::OpenEditor(..) | ViewOp::CloseEditor(_)))
        .collect();
    assert_eq!(
        editor_ops,
        vec![
            ViewOp::OpenEditor(key("10.0.0.1"), DeviceForm::new("Pi 1", "10.0.0.1", "10000")),
            ViewOp::CloseEditor(key("10.0.0.1")),
            ViewOp::OpenEditor(key("10.0.0.2"), DeviceForm::new("Pi 2", "10.0.0.2", "10000")),
        ]
    );
    assert_eq!(h.dashboard.editing(), Some(&key("10.0.0.2")));

    assert!(matches!(h.dashboard.begin_edit("10.9.9.9"), Err(RegistryError::UnknownDevice(_))));
    assert!(h.dashboard.cancel_edit());
    assert!(!h.dashboard.cancel_edit());
}

#[tokio::test]
async fn test_edit_moves_history_to_new_address() {
    let mut h = TestHarness::with_devices(&[("Pi 1", "10.0.0.1", 10000)]);
    h.set_online("10.0.0.1", 45.0, 30.0, 20.0, 40.0);
    h.dashboard.start().await;
    h.dashboard.refresh_now().await;

    h.set_online("10.0.0.11", 46.0, 30.0, 20.0, 40.0);
    h.dashboard.begin_edit("10.0.0.1").unwrap();
    let outcome = h
        .dashboard
        .save_edit(&DeviceForm::new("Pi 1", "10.0.0.11", "10000"))
        .await
        .unwrap();

    assert!(outcome.reachable);
    assert_eq!(h.dashboard.alert().unwrap().message, "Device updated successfully and is reachable.");
    assert_eq!(h.dashboard.editing(), None);
    assert_eq!(h.fleet.records()[0].ip, "10.0.0.11");

    assert!(h.dashboard.history().buffer(&key("10.0.0.1")).is_none());
    assert_eq!(h.dashboard.history().buffer(&key("10.0.0.11")).map(|b| b.len()), Some(3));
    assert!(h.dashboard.cards().state(&key("10.0.0.1")).is_none());
    assert!(h.dashboard.cards().state(&key("10.0.0.11")).is_some());
}

#[tokio::test]
async fn test_edit_failures() {
    let mut h = TestHarness::with_devices(&[("Pi 1", "10.0.0.1", 10000)]);
    h.dashboard.start().await;

    let form = DeviceForm::new("Pi 1", "10.0.0.12", "10000");
    assert!(matches!(h.dashboard.save_edit(&form).await, Err(RegistryError::NotEditing)));

    h.dashboard.begin_edit("10.0.0.1").unwrap();
    let err = h
        .dashboard
        .save_edit(&DeviceForm::new("Pi 1", "10.0.0.12", "99999"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation(_)));
    assert_eq!(h.dashboard.editing(), None);
    assert!(h.dashboard.alert().unwrap().persistent);

    h.dashboard.begin_edit("10.0.0.1").unwrap();
    h.fleet.fail_next(500);
    h.dashboard.save_edit(&form).await.unwrap_err();
    let alert = h.dashboard.alert().unwrap();
    assert_eq!(alert.message, "Error updating device.");
    assert_eq!(alert.level, AlertLevel::Danger);
    assert_eq!(h.fleet.records()[0].ip, "10.0.0.1");
    assert!(h.dashboard.cards().state(&key("10.0.0.1")).is_some());
}

#[tokio::test]
async fn test_unreachable_edit_warns_persistently() {
    let mut h = TestHarness::with_devices(&[("Pi 1", "10.0.0.1", 10000)]);
    h.dashboard.start().await;

    h.dashboard.begin_edit("10.0.0.1").unwrap();
    h.dashboard
        .save_edit(&DeviceForm::new("Pi 1", "10.0.0.13", "10000"))
        .await
        .unwrap();

    let alert = h.dashboard.alert().unwrap();
    assert_eq!(alert.message, "Device updated, but is not reachable (offline or status API unavailable).");
    assert!(alert.persistent);
    assert!(h.view.last_device_list().unwrap()[0].flagged);
}

#[tokio::test]
async fn test_remove_device() {
    let mut h = TestHarness::with_devices(&[("Pi 1", "10.0.0.1", 10000), ("Pi 2", "10.0.0.2", 10000)]);
    h.set_online("10.0.0.1", 45.0, 30.0, 20.0, 40.0);
    h.dashboard.start().await;
    h.dashboard.begin_edit("10.0.0.1").unwrap();

    h.dashboard.remove_device("10.0.0.1").await.unwrap();

    assert_eq!(h.dashboard.registry().len(), 1);
    assert_eq!(h.view.card_order(), vec![key("10.0.0.2")]);
    assert!(h.dashboard.history().buffer(&key("10.0.0.1")).is_none());
    assert_eq!(h.dashboard.editing(), None);
    assert_eq!(h.view.last_counters().map(|c| (c.online, c.offline)), Some((0, 1)));

    let err = h.dashboard.remove_device("10.0.0.1").await.unwrap_err();
    assert!(matches!(err, RegistryError::Fleet(FleetError::Status(404))));
    assert_eq!(h.dashboard.alert().unwrap().message, "Could not delete device.");
    assert_eq!(h.view.card_order(), vec![key("10.0.0.2")]);
}

#[tokio::test(start_paused = true)]
async fn test_console_commands_drive_the_dashboard() {
    let mut h = TestHarness::new();
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    tokio::spawn(async move {
        tx.send(Command::Add { name: "Garage".into(), address: "10.0.0.5".into(), port: "10000".into() })
            .await
            .ok();
        tx.send(Command::Layout).await.ok();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        tx.send(Command::Dismiss).await.ok();
        tx.send(Command::Quit).await.ok();
    });

    h.dashboard.run(rx).await;

    assert_eq!(h.fleet.records().len(), 1);
    assert_eq!(h.dashboard.registry().len(), 1);
    assert_eq!(h.view.card_order(), vec![key("10.0.0.5")]);
    assert_eq!(h.dashboard.layout(), Layout::ThreePerRow);
    assert!(h.view.ops().iter().any(|op| matches!(
        op,
        ViewOp::ShowAlert(alert) if alert.message.starts_with("Device added but not reachable")
    )));
    assert!(h.dashboard.alert().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_ticks_continue_while_add_is_checking() {
    let mut h = TestHarness::new();
    h.set_online("10.0.0.5", 41.0, 30.0, 10.0, 20.0);
    h.status.set_latency(Duration::from_millis(4000));
    let (tx, rx) = tokio::sync::mpsc::channel(4);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        tx.send(Command::Add { name: "Garage".into(), address: "10.0.0.5".into(), port: "10000".into() })
            .await
            .ok();
        tokio::time::sleep(Duration::from_millis(3000)).await;
        tx.send(Command::Quit).await.ok();
    });

    h.dashboard.run(rx).await;

    // le formulaire attend encore la réponse du service, le compte à rebours non
    assert_eq!(h.dashboard.alert().map(|a| a.message.as_str()), Some("Checking device status..."));
    assert!(h.fleet.records().is_empty());
    assert_eq!(h.view.count(|op| matches!(op, ViewOp::SetCountdown(_))), 4);
}
