//! Built-in default catalog

use super::{
    CanonicalSignal, Catalog, EquivalenceEntry, FallbackRule, FallbackWindow, OccurrenceConfig,
    RequirementCatalog, RequirementDefinition, ResolverConfig, ScenarioDefinition, SignalPair,
    SignalRegistry, VehicleConfig, VerdictRule,
};
use crate::requirements::Verdict;

/// Report signal rows: (EVA/BLMS name, SWEET name)
const DOCUMENT_SIGNALS: &[(&str, &str)] = &[
    ("BMS_HVNetworkVoltage_BLMS", "BMS_HVNetworkVoltage_v2"),
    ("ME_InverterHVNetworkVoltage_BLMS", "InverterHVNetworkVoltage"),
    ("PowerRelayState_BLMS", "PowerRelayState"),
    ("DCDCHVNetworkVoltage_EVA", "DCDCHVNetworkVoltage_V2"),
    ("HVbatInstantCurrent_BLMS_v2", "HVBatInstantCurrent_v3"),
    ("HVIsolationImpedance_BLMS", "HVIsolationImpedance_RCY"),
    ("NumHVbattRelaysOpening_BLMS", "Vnx_hv_cnt_ctr"),
    ("ME_InverterCurrent_BLMS_v2", "ME_InverterCurrent"),
    ("HSG_InverterCurrent_BLMS_v2", "HSG_InverterCurrent_BLMS_v2"),
    ("DCDCCurrentOutput_BLMS", "DCDCCurrentOutput"),
    ("AllowedBatteryPower_BLMS", "AvailablePower_v5"),
    ("DCDCInputPower_EVA", "DCDCInputPower"),
    ("BMS_FaultType_BLMS", "BMS_FaultType"),
    ("HVBatterySOC_BLMS", "HVBatterySOC_HV"),
    ("BMS2_FaultType_BLMS", "BMS2_FaultType"),
    ("ME_ElecMachineWorkingMode_BLMS", "ElecMAchineWorkingMod"),
    ("AuxConsumption_LastTrip", "Vxx_aux_cum_cons_last_trp_100ms"),
    ("TotalConsumption_LastTrip", "Vxx_cum_cons_last_trp_100ms"),
    ("ACchargeInletTemp_BLMS", "ACchargeInletTemp"),
    ("ChargingPlugConnected_v2", "ChargingPlugConnected"),
    ("CHGAvailableChargingPower_BLMS", "CHGAvailableChargingPower"),
    ("CHGTemp_BLMS", "CHGTemp"),
    ("CHGWaterTemp_BLMS", "CHGWaterTemp"),
    ("ChargeSpotPowerLevel", "ChargeSpotPowerLevel"),
    ("GearboxPositionTarget_EVA", "GearboxPosition"),
    ("ParkStatus_EVA", "ParkStatus"),
    ("EngCoolPmpSpdMes_EVA", "EngCoolPmpSpeed"),
    ("ME_TorqueRequest_v2", "ME_TorqueRequest"),
    ("ME_ElecMachineTorque_v2", "ElecMachineTorque"),
    ("HVBatteryEnergyLevel", "Vxx_hvb_soc_mmi_100ms"),
    ("VehicleAutonomyZEVdisplay", "VehicleAutonomyZEV"),
];

const SCENARIOS: &[(&str, &[&str])] = &[
    (
        "UC 1.1 - Endo-Réveil",
        &[
            "HEVC_WakeUpSleepCommand",
            "BMS_RefusetoSleep",
            "PowerRelayState",
            "BMS_HVNetworkVoltage_BLMS",
        ],
    ),
    (
        "UC 1.2 - Traction - Roulage",
        &["VehicleStates", "MotorTorque_Actual", "VehicleSpeed"],
    ),
    (
        "UC 1.3 - CHG AC",
        &["ChargerState", "ChargingPower", "ChargerConnected"],
    ),
    (
        "UC 1.4 - Presoak Programmé",
        &["PresoakActive", "BatteryTemp", "AmbientTemp"],
    ),
    (
        "UC 1.5 - Extrafeeding",
        &["ExtrafeedingActive", "DCDCVoltage", "LVBatteryVoltage"],
    ),
    (
        "UC 1.6 - DC Charge and stop",
        &["DCChargeActive", "ChargingCurrent_DC", "ChargingVoltage_DC"],
    ),
];

const REQUIREMENTS: &[&str] = &[
    "REQ_SYS_HV_NW_Remote_148",
    "REQ_SYS_Comm_488",
    "REQ_SYS_Comm_489",
    "REQ_SYS_Comm_490",
    "REQ_SYS_Comm_491",
    "REQ_SYS_Comm_492",
    "REQ_SYS_Comm_493",
    "REQ_SYS_Comm_502",
    "REQ_SYS_Comm_503",
    "REQ_SYS_Comm_507",
    "REQ_SYS_Comm_508",
    "REQ_SYS_Comm_509",
    "REQ_SYS_Comm_510",
    "REQ_SYS_Comm_511",
    "REQ_SYS_Comm_512",
    "REQ_SYS_Comm_513",
    "REQ_SYS_Comm_514",
    "REQ_SYS_Comm_515",
    "REQ_SYS_Comm_516",
    "REQ_SYS_Comm_517",
    "REQ_SYS_Comm_518",
    "REQ_SYS_AC-Charge_489",
    "REQ_SYS_Combo-Fast-Charge_458",
    "REQ_SYS_Peak-Off-Charge-Opt_68",
    "REQ_SYS_AC-Charge_329",
    "REQ_SYS_Electric_drive_1310",
    "REQ_SYS_Electric_drive_1312",
    "REQ_SYS_Cooling_Design_2618",
    "REQ_SYS_Cooling_Design_2616",
    "REQ_SYS_Cooling_Design_2614",
    "REQ_SYS_Cooling_Design_2612",
    "REQ_SYS_Cooling_Design_2610",
    "REQ_SYS_Cooling_Design_2608",
    "REQ_SYS_Cooling_Design_2606",
    "REQ_SYS_Cooling_Design_2605",
    "REQ_SYS_Cooling_Design_2603",
    "REQ_SYS_Cooling_Design_2602",
    "REQ_SYS_Cooling_Design_2601",
    "REQ_SYS_Cooling_Design_2599",
    "REQ_SYS_GRA_NEW_394",
    "REQ_SYS_GRA_NEW_395",
    "REQ_SYS_GRA_NEW_396",
];

pub(super) fn vin_signals() -> Vec<String> {
    [
        "VIN",
        "VehicleIdentificationNumber",
        "Vehicle_ID",
        "VIN_Code",
        "VIN_Number",
        "VehID_VIN",
        "BCM_VIN",
    ]
    .map(String::from)
    .to_vec()
}

fn window(start_s: f64, end_s: f64, note: &str) -> FallbackWindow {
    FallbackWindow {
        start_s,
        end_s,
        note: note.to_string(),
        requires_filename: Vec::new(),
    }
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

pub(super) fn fallback_rules() -> Vec<FallbackRule> {
    vec![
        FallbackRule {
            scenario_keyword: "Réveil".to_string(),
            filename_keywords: keywords(&["Réveil", "Reveil"]),
            windows: vec![window(15.5, 105.2, "Wake-up sequence")],
        },
        FallbackRule {
            scenario_keyword: "Traction".to_string(),
            filename_keywords: keywords(&["Traction", "Roulage"]),
            windows: vec![
                window(130.0, 931.7, "Main driving phase"),
                FallbackWindow {
                    requires_filename: keywords(&["ChargeDC"]),
                    ..window(1125.2, 1512.8, "Secondary driving phase")
                },
            ],
        },
        FallbackRule {
            scenario_keyword: "CHG".to_string(),
            filename_keywords: keywords(&["Charge", "CHG"]),
            windows: vec![window(1800.0, 2715.5, "AC charging session")],
        },
    ]
}

/// Registry: one entry per document row, then one per scenario token
/// not already covered by a document row.
fn registry() -> SignalRegistry {
    let mut entries: Vec<CanonicalSignal> = DOCUMENT_SIGNALS
        .iter()
        .enumerate()
        .map(|(i, (primary, secondary))| {
            let signal = CanonicalSignal::new(format!("A{}", i + 1), *primary);
            if primary == secondary {
                signal
            } else {
                signal.with_alias(*secondary)
            }
        })
        .collect();

    for token in SCENARIOS.iter().flat_map(|(_, signals)| signals.iter()) {
        if !entries.iter().any(|e| e.canonical_name.contains(token)) {
            let id = format!("A{}", entries.len() + 1);
            entries.push(CanonicalSignal::new(id, *token));
        }
    }

    SignalRegistry::new(entries)
}

pub(super) fn catalog() -> Catalog {
    let scenarios = SCENARIOS
        .iter()
        .map(|(name, signals)| ScenarioDefinition::new(*name, signals.iter().copied()))
        .collect();

    let requirements = RequirementCatalog {
        entries: REQUIREMENTS
            .iter()
            .map(|id| RequirementDefinition {
                description: format!("Requirement {}", id),
                ..RequirementDefinition::new(*id)
            })
            .collect(),
        rules: vec![
            VerdictRule {
                requirement_contains: "Comm".to_string(),
                scenario_contains: "Réveil".to_string(),
                verdict: Verdict::Ok,
            },
            VerdictRule {
                requirement_contains: "Cooling".to_string(),
                scenario_contains: "Traction".to_string(),
                verdict: Verdict::Partial,
            },
            VerdictRule {
                requirement_contains: "Electric".to_string(),
                scenario_contains: "Traction".to_string(),
                verdict: Verdict::Ok,
            },
        ],
    };

    // Document rows double as the default equivalence table
    let equivalences = DOCUMENT_SIGNALS
        .iter()
        .map(|(primary, secondary)| EquivalenceEntry {
            signal: primary.to_string(),
            equivalent: secondary.to_string(),
            can_fallback: String::new(),
        })
        .collect();

    Catalog {
        signals: registry(),
        scenarios,
        resolver: ResolverConfig::default(),
        occurrences: OccurrenceConfig::default(),
        requirements,
        equivalences,
        document_signals: DOCUMENT_SIGNALS
            .iter()
            .map(|(primary, secondary)| SignalPair::new(*primary, *secondary))
            .collect(),
        vehicle: VehicleConfig::default(),
    }
}
