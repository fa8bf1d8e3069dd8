//! Record store field names.

pub mod sender {
    pub const ID: &str = "ID";
    pub const LAST_LONG_RESPONSE: &str = "Last Long Response";
    pub const MESSAGES: &str = "Messages";

    /// Fields written back when a sender row is merged.
    pub const WRITABLE: &[&str] = &[ID, LAST_LONG_RESPONSE, MESSAGES];
}

pub mod message {
    pub const CHAPTER: &str = "Chapter";
    pub const DATE_RECEIVED: &str = "Date Received";
    pub const SENDER: &str = "Sender";
    pub const TEXT: &str = "Text";
}

pub mod photo {
    pub const PHOTO: &str = "Photo";
    pub const WIDTH: &str = "Width";
    pub const HEIGHT: &str = "Height";
    pub const FILENAME: &str = "Filename";
    pub const MESSAGE: &str = "Message";
}

pub mod destination {
    pub const PHONE_NUMBER: &str = "SMS Phone Number";
    pub const NAME: &str = "Chapter Name";
    pub const ABBREVIATION: &str = "City Name Abbreviation";
    pub const TIMEZONE: &str = "Timezone";
    pub const DRIVE_FOLDER: &str = "Google Drive Folder";
    pub const SLACK_CHANNEL: &str = "Slack Channel";
}
