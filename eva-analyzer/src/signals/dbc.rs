//! DBC file parser
//!
//! Parses Vector DBC files with `can-dbc` and converts them into the
//! signal database format.

use crate::signals::database::{
    ByteOrder, MessageDefinition, MultiplexerInfo, SignalDefinition, ValueType,
};
use crate::types::{AnalyzerError, Result};
use std::path::Path;

/// Parse a DBC file and return its message definitions
pub fn parse_dbc_file(path: &Path) -> Result<Vec<MessageDefinition>> {
    log::info!("Parsing DBC file: {:?}", path);

    let bytes = std::fs::read(path).map_err(|e| {
        AnalyzerError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    // Vector tools write Windows-1252 more often than UTF-8
    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("DBC file {:?} is not UTF-8, reading as Latin-1", path);
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.dbc");

    let messages = parse_dbc_str(&content, source)?;
    log::info!("Parsed {} messages from {:?}", messages.len(), path);
    Ok(messages)
}

/// Parse DBC content already held in memory
pub fn parse_dbc_str(content: &str, source: &str) -> Result<Vec<MessageDefinition>> {
    let dbc = can_dbc::DBC::from_slice(content.as_bytes()).map_err(|e| {
        AnalyzerError::DbcParseError(format!("Failed to parse DBC {}: {:?}", source, e))
    })?;

    dbc.messages()
        .iter()
        .map(|msg| convert_message(msg, source))
        .collect()
}

fn convert_message(dbc_msg: &can_dbc::Message, source: &str) -> Result<MessageDefinition> {
    let multiplexer_signal = dbc_msg
        .signals()
        .iter()
        .find(|s| matches!(s.multiplexer_indicator(), can_dbc::MultiplexIndicator::Multiplexor))
        .map(|s| s.name().to_string());

    let is_multiplexed = multiplexer_signal.is_some()
        || dbc_msg.signals().iter().any(|s| {
            matches!(
                s.multiplexer_indicator(),
                can_dbc::MultiplexIndicator::MultiplexedSignal(_)
            )
        });

    let signals = dbc_msg
        .signals()
        .iter()
        .map(|sig| convert_signal(sig, multiplexer_signal.as_deref()))
        .collect::<Result<Vec<_>>>()?;

    Ok(MessageDefinition {
        id: dbc_msg.message_id().0,
        name: dbc_msg.message_name().to_string(),
        size: *dbc_msg.message_size() as usize,
        sender: match dbc_msg.transmitter() {
            can_dbc::Transmitter::NodeName(name) => Some(name.to_string()),
            _ => None,
        },
        signals,
        is_multiplexed,
        multiplexer_signal,
        source: source.to_string(),
    })
}

fn convert_signal(
    dbc_sig: &can_dbc::Signal,
    multiplexer_signal: Option<&str>,
) -> Result<SignalDefinition> {
    let byte_order = match *dbc_sig.byte_order() {
        can_dbc::ByteOrder::LittleEndian => ByteOrder::LittleEndian,
        can_dbc::ByteOrder::BigEndian => ByteOrder::BigEndian,
    };

    let value_type = match *dbc_sig.value_type() {
        can_dbc::ValueType::Signed => ValueType::Signed,
        can_dbc::ValueType::Unsigned => ValueType::Unsigned,
    };

    let multiplexer_info = match *dbc_sig.multiplexer_indicator() {
        can_dbc::MultiplexIndicator::MultiplexedSignal(switch_value) => {
            let multiplexer = multiplexer_signal.ok_or_else(|| {
                AnalyzerError::DbcParseError(format!(
                    "Multiplexed signal '{}' but no multiplexer found",
                    dbc_sig.name()
                ))
            })?;
            Some(MultiplexerInfo {
                multiplexer_signal: multiplexer.to_string(),
                multiplexer_values: vec![switch_value as u64],
            })
        }
        _ => None,
    };

    Ok(SignalDefinition {
        name: dbc_sig.name().to_string(),
        start_bit: *dbc_sig.start_bit() as u16,
        length: *dbc_sig.signal_size() as u16,
        byte_order,
        value_type,
        factor: *dbc_sig.factor(),
        offset: *dbc_sig.offset(),
        unit: if dbc_sig.unit().is_empty() {
            None
        } else {
            Some(dbc_sig.unit().to_string())
        },
        multiplexer_info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BMS_DBC: &str = r#"
VERSION ""

NS_ :

BS_:

BU_: BMS HEVC

BO_ 341 BMS_Status: 8 BMS
 SG_ BMS_HVNetworkVoltage : 0|16@1+ (0.1,0) [0|1000] "V" HEVC
 SG_ HVBatterySOC : 16|8@1+ (0.5,0) [0|100] "%" HEVC

BO_ 512 HEVC_Command: 8 HEVC
 SG_ HEVC_WakeUpSleepCommand : 0|2@1+ (1,0) [0|3] "" BMS
"#;

    #[test]
    fn test_parse_dbc_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BMS_DBC.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let messages = parse_dbc_file(temp_file.path()).unwrap();
        assert_eq!(messages.len(), 2);

        let status = &messages[0];
        assert_eq!(status.id, 341);
        assert_eq!(status.name, "BMS_Status");
        assert_eq!(status.size, 8);
        assert_eq!(status.sender, Some("BMS".to_string()));
        assert_eq!(status.signals.len(), 2);

        let voltage = &status.signals[0];
        assert_eq!(voltage.name, "BMS_HVNetworkVoltage");
        assert_eq!(voltage.length, 16);
        assert_eq!(voltage.factor, 0.1);
        assert_eq!(voltage.unit, Some("V".to_string()));
        assert!(!status.is_multiplexed);
    }

    #[test]
    fn test_parse_multiplexed_signals() {
        let dbc_content = r#"
VERSION ""

NS_ :

BS_:

BU_: ECU1

BO_ 512 MultiplexedMsg: 8 ECU1
 SG_ Mode M : 0|8@1+ (1,0) [0|3] "" ECU1
 SG_ SignalA m0 : 8|16@1+ (1,0) [0|100] "%" ECU1
 SG_ SignalB m1 : 8|16@1+ (0.1,0) [0|1000] "mV" ECU1
"#;

        let messages = parse_dbc_str(dbc_content, "mux.dbc").unwrap();
        let msg = &messages[0];
        assert!(msg.is_multiplexed);
        assert_eq!(msg.multiplexer_signal, Some("Mode".to_string()));

        let sig_b = msg.signals.iter().find(|s| s.name == "SignalB").unwrap();
        let mux = sig_b.multiplexer_info.as_ref().unwrap();
        assert_eq!(mux.multiplexer_signal, "Mode");
        assert_eq!(mux.multiplexer_values, vec![1]);
    }

    #[test]
    fn test_missing_dbc_file() {
        let result = parse_dbc_file(Path::new("missing.dbc"));
        assert!(matches!(result, Err(AnalyzerError::DbcParseError(_))));
    }
}
