//! Demo application: a held key lights its whole row and column.

use gridosc_core::KeyEvent;

use crate::application::grid_client::{Grid, GridApp};

/// Prefix the demo asks devices to use.
pub const HELLO_PREFIX: &str = "hello";

#[derive(Debug, Default)]
pub struct Hello;

impl GridApp for Hello {
    fn ready(&mut self, grid: &mut dyn Grid) {
        grid.led_all(0);
    }

    fn grid_key(&mut self, grid: &mut dyn Grid, key: KeyEvent) {
        let (x, y) = key.coords();
        let s = key.state.as_int() as u8;
        grid.led_row(0, y, &vec![s; grid.width() as usize]);
        grid.led_col(x, 0, &vec![s; grid.height() as usize]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::grid_client::GridClient;
    use crate::infrastructure::transport::mock::RecordingSink;
    use gridosc_core::{InboundMessage, OutboundMessage};

    #[test]
    fn test_press_lights_row_and_column_across_device() {
        // Arrange
        let sink = RecordingSink::new();
        let mut client = GridClient::new(HELLO_PREFIX, "127.0.0.1:9000".parse().unwrap(), Box::new(sink.clone()));
        client.apply_sys(&InboundMessage::SysSize {
            width: 16,
            height: 8,
        });

        // Act
        Hello.grid_key(&mut client, KeyEvent::press(3, 5));

        // Assert
        assert_eq!(
            sink.messages(),
            vec![
                OutboundMessage::LedRow {
                    x_offset: 0,
                    y: 5,
                    data: vec![1; 16]
                },
                OutboundMessage::LedCol {
                    x: 3,
                    y_offset: 0,
                    data: vec![1; 8]
                },
            ]
        );
    }

    #[test]
    fn test_release_clears_row_and_column() {
        let sink = RecordingSink::new();
        let mut client = GridClient::new(HELLO_PREFIX, "127.0.0.1:9000".parse().unwrap(), Box::new(sink.clone()));
        client.apply_sys(&InboundMessage::SysSize {
            width: 8,
            height: 8,
        });
        Hello.grid_key(&mut client, KeyEvent::release(0, 0));
        assert!(sink.messages().iter().all(|m| match m {
            OutboundMessage::LedRow { data, .. } | OutboundMessage::LedCol { data, .. } => {
                data.iter().all(|&v| v == 0)
            }
            _ => false,
        }));
    }
}
