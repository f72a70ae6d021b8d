// ============================================================================
// drapto-core/src/notifications/mod.rs
// ============================================================================
//
// NOTIFICATIONS: Sending Progress and Status Updates
//
// This module provides functionality for sending notifications about encoding
// progress and status. It uses the ntfy.sh service to deliver push notifications
// to users about encoding start, completion, and errors.
//
// KEY COMPONENTS:
// - NotificationType: Notification payload shapes and message formatting
// - NtfyNotificationSender: Implementation using the ntfy.sh service
//
// AI-ASSISTANT-INFO: Notification system for sending encoding status updates

// ---- Module declarations ----
mod abstraction;
mod ntfy;

// ---- Re-exports ----
pub use abstraction::NotificationType;
pub use ntfy::NtfyNotificationSender;
