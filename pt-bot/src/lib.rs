// ライブラリエントリ。統合テストとpt-cliから内部モジュールを参照できるように
// バイナリ（main.rs）と同じモジュールを公開する。
pub mod catalog;
pub mod commands;
pub mod handler;
pub mod interactions;
pub mod notifier;
pub mod order;
pub mod pricing;
pub mod server_settings;
pub mod ui;
