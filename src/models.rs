//! Data models for the Toon cloud API
//!
//! The vendor reports everything in scaled integers (centi-degrees, Wh,
//! cm3) and omits sections that did not change since the last report.
//! Each section therefore has a companion `*Update` struct deserialized
//! from the wire payload; applying an update only overwrites the fields
//! that are actually present.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Agreements
// ============================================================================

/// A utility agreement (one Toon display) linked to the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    pub agreement_id: String,
    pub display_common_name: String,
    #[serde(default)]
    pub agreement_id_checksum: Option<String>,
    #[serde(default)]
    pub display_hardware_version: Option<String>,
    #[serde(default)]
    pub display_software_version: Option<String>,
    #[serde(default)]
    pub heating_type: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub house_number: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub is_toon_solar: Option<bool>,
    #[serde(default)]
    pub is_toonly: Option<bool>,
}

// ============================================================================
// Vendor enums
// ============================================================================

/// Thermostat preset reported in `activeState`.
///
/// Negative wire values mean "no state" and decode to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveState {
    Comfort,
    Home,
    Sleep,
    Away,
    Holiday,
    Off,
}

impl ActiveState {
    pub fn from_raw(value: i64) -> Option<Self> {
        match value {
            0 => Some(ActiveState::Comfort),
            1 => Some(ActiveState::Home),
            2 => Some(ActiveState::Sleep),
            3 => Some(ActiveState::Away),
            4 => Some(ActiveState::Holiday),
            5 => Some(ActiveState::Off),
            _ => None,
        }
    }

    pub fn as_raw(self) -> i64 {
        match self {
            ActiveState::Comfort => 0,
            ActiveState::Home => 1,
            ActiveState::Sleep => 2,
            ActiveState::Away => 3,
            ActiveState::Holiday => 4,
            ActiveState::Off => 5,
        }
    }
}

impl std::fmt::Display for ActiveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveState::Comfort => write!(f, "comfort"),
            ActiveState::Home => write!(f, "home"),
            ActiveState::Sleep => write!(f, "sleep"),
            ActiveState::Away => write!(f, "away"),
            ActiveState::Holiday => write!(f, "holiday"),
            ActiveState::Off => write!(f, "off"),
        }
    }
}

/// Program mode reported in `programState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramState {
    Off,
    On,
    Override,
}

impl ProgramState {
    pub fn from_raw(value: i64) -> Option<Self> {
        match value {
            0 => Some(ProgramState::Off),
            1 => Some(ProgramState::On),
            2 => Some(ProgramState::Override),
            _ => None,
        }
    }

    pub fn as_raw(self) -> i64 {
        match self {
            ProgramState::Off => 0,
            ProgramState::On => 1,
            ProgramState::Override => 2,
        }
    }
}

/// Boiler state reported in `burnerInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurnerState {
    Off,
    On,
    TapWater,
    Preheating,
}

impl BurnerState {
    pub fn from_raw(value: i64) -> Option<Self> {
        match value {
            0 => Some(BurnerState::Off),
            1 => Some(BurnerState::On),
            2 => Some(BurnerState::TapWater),
            3 => Some(BurnerState::Preheating),
            _ => None,
        }
    }
}

// ============================================================================
// Thermostat
// ============================================================================

/// Current thermostat state. Temperatures are degrees Celsius.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThermostatInfo {
    pub active_state: Option<ActiveState>,
    pub boiler_module_connected: Option<bool>,
    pub burner_state: Option<BurnerState>,
    pub current_display_temperature: Option<f64>,
    pub current_humidity: Option<i64>,
    pub current_modulation_level: Option<i64>,
    pub current_setpoint: Option<f64>,
    pub error_found: Option<bool>,
    pub has_boiler_fault: Option<bool>,
    pub have_opentherm_boiler: Option<bool>,
    pub holiday_mode: Option<bool>,
    pub next_program: Option<i64>,
    pub next_setpoint: Option<f64>,
    pub next_state: Option<i64>,
    pub next_time: Option<DateTime<Utc>>,
    pub opentherm_communication_error: Option<bool>,
    pub program_state: Option<ProgramState>,
    pub real_setpoint: Option<f64>,
    pub set_by_load_shifting: Option<bool>,
    pub last_updated_from_display: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl ThermostatInfo {
    /// Whether the burner is on, in any mode.
    pub fn burner(&self) -> Option<bool> {
        self.burner_state.map(|state| state != BurnerState::Off)
    }

    /// Whether the burner is heating tap water.
    pub fn hot_tapwater(&self) -> Option<bool> {
        self.burner_state.map(|state| state == BurnerState::TapWater)
    }

    /// Whether the burner is heating the house.
    pub fn heating(&self) -> Option<bool> {
        self.burner_state.map(|state| state == BurnerState::On)
    }

    /// Whether the burner is pre-heating for the next program slot.
    pub fn pre_heating(&self) -> Option<bool> {
        self.burner_state.map(|state| state == BurnerState::Preheating)
    }

    /// Whether the thermostat follows its program.
    pub fn program(&self) -> Option<bool> {
        self.program_state
            .map(|state| matches!(state, ProgramState::On | ProgramState::Override))
    }

    /// Whether the program is temporarily overridden.
    pub fn program_overridden(&self) -> Option<bool> {
        self.program_state.map(|state| state == ProgramState::Override)
    }

    pub(crate) fn apply(&mut self, update: ThermostatUpdate, now: DateTime<Utc>) {
        if let Some(raw) = update.active_state {
            self.active_state = ActiveState::from_raw(raw);
            self.holiday_mode = Some(raw == ActiveState::Holiday.as_raw());
        }
        if let Some(connected) = update.boiler_module_connected {
            self.boiler_module_connected = Some(connected);
        }
        if let Some(raw) = update.burner_info {
            self.burner_state = BurnerState::from_raw(raw);
        }
        if let Some(raw) = update.current_display_temp {
            self.current_display_temperature = Some(centi_degrees(raw));
        }
        if let Some(humidity) = update.current_humidity {
            self.current_humidity = Some(humidity);
        }
        if let Some(level) = update.current_modulation_level {
            self.current_modulation_level = Some(level);
        }
        if let Some(raw) = update.current_setpoint {
            self.current_setpoint = Some(centi_degrees(raw));
        }
        // 255 is the vendor sentinel for "no error"
        if let Some(code) = update.error_found {
            self.error_found = Some(code != 255);
        }
        if let Some(fault) = update.has_boiler_fault {
            self.has_boiler_fault = Some(fault);
        }
        if let Some(opentherm) = update.have_ot_boiler {
            self.have_opentherm_boiler = Some(opentherm);
        }
        if let Some(program) = update.next_program {
            self.next_program = non_negative(program);
        }
        if let Some(raw) = update.next_setpoint {
            self.next_setpoint = Some(centi_degrees(raw));
        }
        if let Some(state) = update.next_state {
            self.next_state = non_negative(state);
        }
        if let Some(timestamp) = update.next_time {
            self.next_time = java_timestamp(timestamp);
        }
        if let Some(error) = update.ot_comm_error {
            self.opentherm_communication_error = Some(error);
        }
        if let Some(raw) = update.program_state {
            self.program_state = ProgramState::from_raw(raw);
        }
        if let Some(raw) = update.real_setpoint {
            self.real_setpoint = Some(centi_degrees(raw));
        }
        if let Some(shifted) = update.set_by_load_shifting {
            self.set_by_load_shifting = Some(shifted);
        }
        if let Some(timestamp) = update.last_updated_from_display {
            self.last_updated_from_display = java_timestamp(timestamp);
        }
        self.last_updated = Some(now);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ThermostatUpdate {
    pub(crate) active_state: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub(crate) boiler_module_connected: Option<bool>,
    // the display reports this one as a string
    #[serde(default, deserialize_with = "lenient_i64")]
    pub(crate) burner_info: Option<i64>,
    pub(crate) current_display_temp: Option<f64>,
    pub(crate) current_humidity: Option<i64>,
    pub(crate) current_modulation_level: Option<i64>,
    pub(crate) current_setpoint: Option<f64>,
    pub(crate) error_found: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub(crate) has_boiler_fault: Option<bool>,
    #[serde(rename = "haveOTBoiler", default, deserialize_with = "lenient_bool")]
    pub(crate) have_ot_boiler: Option<bool>,
    pub(crate) next_program: Option<i64>,
    pub(crate) next_setpoint: Option<f64>,
    pub(crate) next_state: Option<i64>,
    pub(crate) next_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub(crate) ot_comm_error: Option<bool>,
    pub(crate) program_state: Option<i64>,
    pub(crate) real_setpoint: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub(crate) set_by_load_shifting: Option<bool>,
    pub(crate) last_updated_from_display: Option<i64>,
}

// ============================================================================
// Power usage
// ============================================================================

/// Electricity readings. Instantaneous values are watts, totals are kWh.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PowerUsage {
    pub average: Option<f64>,
    pub average_produced: Option<f64>,
    pub average_solar: Option<f64>,
    pub current: Option<i64>,
    pub current_produced: Option<i64>,
    pub current_solar: Option<i64>,
    pub day_average: Option<f64>,
    pub day_cost: Option<f64>,
    pub day_high_usage: Option<f64>,
    pub day_low_usage: Option<f64>,
    pub day_max_solar: Option<i64>,
    pub day_produced_solar: Option<f64>,
    pub is_smart: Option<bool>,
    pub meter_high: Option<f64>,
    pub meter_low: Option<f64>,
    pub meter_produced_high: Option<f64>,
    pub meter_produced_low: Option<f64>,
    pub last_updated_from_display: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl PowerUsage {
    /// Total usage today across both tariffs, in kWh.
    pub fn day_usage(&self) -> Option<f64> {
        match (self.day_high_usage, self.day_low_usage) {
            (Some(high), Some(low)) => Some(round_to(high + low, 2)),
            _ => None,
        }
    }

    /// Solar production delivered back to the grid today, in kWh.
    pub fn day_to_grid_usage(&self) -> Option<f64> {
        match (self.day_usage(), self.day_produced_solar) {
            (Some(usage), Some(produced)) => {
                Some(round_to(usage - produced, 2).min(0.0).abs())
            }
            _ => None,
        }
    }

    /// Usage drawn from the grid today beyond solar production, in kWh.
    pub fn day_from_grid_usage(&self) -> Option<f64> {
        match (self.day_produced_solar, self.day_usage()) {
            (Some(produced), Some(usage)) => {
                Some(round_to(produced - usage, 2).min(0.0).abs())
            }
            _ => None,
        }
    }

    /// Share of the current usage covered by solar production, capped at 100%.
    pub fn current_covered_by_solar(&self) -> Option<i64> {
        match (self.current_solar, self.current) {
            (Some(solar), Some(current)) if current != 0 => {
                Some((((solar as f64 / current as f64) * 100.0).round() as i64).min(100))
            }
            _ => None,
        }
    }

    pub(crate) fn apply(&mut self, update: PowerUsageUpdate, now: DateTime<Utc>) {
        if let Some(average) = update.avg_value {
            self.average = Some(average);
        }
        if let Some(produced) = update.avg_produ_value {
            self.average_produced = Some(produced);
        }
        if let Some(solar) = update.avg_solar_value {
            self.average_solar = Some(solar);
        }
        if let Some(current) = update.value {
            self.current = Some(current.round() as i64);
        }
        if let Some(produced) = update.value_produced {
            self.current_produced = Some(produced.round() as i64);
        }
        if let Some(solar) = update.value_solar {
            self.current_solar = Some(solar.round() as i64);
        }
        if let Some(raw) = update.avg_day_value {
            self.day_average = Some(watt_hours(raw));
        }
        if let Some(cost) = update.day_cost {
            self.day_cost = Some(cost);
        }
        if let Some(raw) = update.day_usage {
            self.day_high_usage = Some(watt_hours(raw));
        }
        if let Some(raw) = update.day_low_usage {
            self.day_low_usage = Some(watt_hours(raw));
        }
        if let Some(max) = update.max_solar {
            self.day_max_solar = Some(max);
        }
        if let Some(raw) = update.solar_produced_today {
            self.day_produced_solar = Some(watt_hours(raw));
        }
        if let Some(smart) = update.is_smart {
            self.is_smart = Some(smart);
        }
        if let Some(raw) = update.meter_reading {
            self.meter_high = Some(watt_hours(raw));
        }
        if let Some(raw) = update.meter_reading_low {
            self.meter_low = Some(watt_hours(raw));
        }
        if let Some(raw) = update.meter_reading_produ {
            self.meter_produced_high = Some(watt_hours(raw));
        }
        if let Some(raw) = update.meter_reading_low_produ {
            self.meter_produced_low = Some(watt_hours(raw));
        }
        if let Some(timestamp) = update.last_updated_from_display {
            self.last_updated_from_display = java_timestamp(timestamp);
        }
        self.last_updated = Some(now);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PowerUsageUpdate {
    pub(crate) avg_value: Option<f64>,
    pub(crate) avg_produ_value: Option<f64>,
    pub(crate) avg_solar_value: Option<f64>,
    pub(crate) value: Option<f64>,
    pub(crate) value_produced: Option<f64>,
    pub(crate) value_solar: Option<f64>,
    pub(crate) avg_day_value: Option<f64>,
    pub(crate) day_cost: Option<f64>,
    pub(crate) day_usage: Option<f64>,
    pub(crate) day_low_usage: Option<f64>,
    pub(crate) max_solar: Option<i64>,
    pub(crate) solar_produced_today: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub(crate) is_smart: Option<bool>,
    pub(crate) meter_reading: Option<f64>,
    pub(crate) meter_reading_low: Option<f64>,
    pub(crate) meter_reading_produ: Option<f64>,
    pub(crate) meter_reading_low_produ: Option<f64>,
    pub(crate) last_updated_from_display: Option<i64>,
}

// ============================================================================
// Gas usage
// ============================================================================

/// Gas readings, in cubic meters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GasUsage {
    pub average: Option<f64>,
    pub current: Option<f64>,
    pub day_average: Option<f64>,
    pub day_cost: Option<f64>,
    pub day_usage: Option<f64>,
    pub is_smart: Option<bool>,
    pub meter: Option<f64>,
    pub last_updated_from_display: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl GasUsage {
    pub(crate) fn apply(&mut self, update: GasUsageUpdate, now: DateTime<Utc>) {
        if let Some(raw) = update.avg_value {
            self.average = Some(cubic_centimeters(raw));
        }
        if let Some(raw) = update.value {
            self.current = Some(cubic_centimeters(raw));
        }
        if let Some(raw) = update.avg_day_value {
            self.day_average = Some(cubic_centimeters(raw));
        }
        if let Some(cost) = update.day_cost {
            self.day_cost = Some(cost);
        }
        if let Some(raw) = update.day_usage {
            self.day_usage = Some(cubic_centimeters(raw));
        }
        if let Some(smart) = update.is_smart {
            self.is_smart = Some(smart);
        }
        if let Some(raw) = update.meter_reading {
            self.meter = Some(cubic_centimeters(raw));
        }
        if let Some(timestamp) = update.last_updated_from_display {
            self.last_updated_from_display = java_timestamp(timestamp);
        }
        self.last_updated = Some(now);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GasUsageUpdate {
    pub(crate) avg_value: Option<f64>,
    pub(crate) value: Option<f64>,
    pub(crate) avg_day_value: Option<f64>,
    pub(crate) day_cost: Option<f64>,
    pub(crate) day_usage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub(crate) is_smart: Option<bool>,
    pub(crate) meter_reading: Option<f64>,
    pub(crate) last_updated_from_display: Option<i64>,
}

// ============================================================================
// Water usage
// ============================================================================

/// Water readings. Instantaneous values are liters per minute, totals m3.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WaterUsage {
    pub average: Option<f64>,
    pub current: Option<f64>,
    pub day_average: Option<f64>,
    pub day_cost: Option<f64>,
    pub day_usage: Option<f64>,
    pub installed: Option<bool>,
    pub is_smart: Option<bool>,
    pub meter: Option<f64>,
    pub last_updated_from_display: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl WaterUsage {
    pub(crate) fn apply(&mut self, update: WaterUsageUpdate, now: DateTime<Utc>) {
        if let Some(raw) = update.avg_value {
            self.average = Some(liters_per_minute(raw));
        }
        if let Some(raw) = update.value {
            self.current = Some(liters_per_minute(raw));
        }
        if let Some(raw) = update.avg_day_value {
            self.day_average = Some(cubic_centimeters(raw));
        }
        if let Some(cost) = update.day_cost {
            self.day_cost = Some(cost);
        }
        if let Some(raw) = update.day_usage {
            self.day_usage = Some(cubic_centimeters(raw));
        }
        if let Some(installed) = update.installed {
            self.installed = Some(installed);
        }
        if let Some(smart) = update.is_smart {
            self.is_smart = Some(smart);
        }
        if let Some(raw) = update.meter_reading {
            self.meter = Some(cubic_centimeters(raw));
        }
        if let Some(timestamp) = update.last_updated_from_display {
            self.last_updated_from_display = java_timestamp(timestamp);
        }
        self.last_updated = Some(now);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WaterUsageUpdate {
    pub(crate) avg_value: Option<f64>,
    pub(crate) value: Option<f64>,
    pub(crate) avg_day_value: Option<f64>,
    pub(crate) day_cost: Option<f64>,
    pub(crate) day_usage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub(crate) installed: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub(crate) is_smart: Option<bool>,
    pub(crate) meter_reading: Option<f64>,
    pub(crate) last_updated_from_display: Option<i64>,
}

// ============================================================================
// Status snapshot
// ============================================================================

/// The merged in-memory view of the latest device status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub agreement: Agreement,
    pub thermostat: ThermostatInfo,
    pub power_usage: PowerUsage,
    pub gas_usage: GasUsage,
    pub water_usage: WaterUsage,
    pub last_updated_from_display: Option<DateTime<Utc>>,
    pub server_time: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Status {
    /// An empty snapshot bound to the given agreement.
    pub fn new(agreement: Agreement) -> Self {
        Self {
            agreement,
            thermostat: ThermostatInfo::default(),
            power_usage: PowerUsage::default(),
            gas_usage: GasUsage::default(),
            water_usage: WaterUsage::default(),
            last_updated_from_display: None,
            server_time: None,
            last_updated: None,
        }
    }

    /// Merge a (possibly partial) vendor status document into the snapshot.
    /// Sections and fields absent from the update keep their current values.
    pub(crate) fn apply(&mut self, update: StatusUpdate) {
        let now = Utc::now();
        if let Some(thermostat) = update.thermostat_info {
            self.thermostat.apply(thermostat, now);
        }
        if let Some(power) = update.power_usage {
            self.power_usage.apply(power, now);
        }
        if let Some(gas) = update.gas_usage {
            self.gas_usage.apply(gas, now);
        }
        if let Some(water) = update.water_usage {
            self.water_usage.apply(water, now);
        }
        if let Some(timestamp) = update.last_update_from_display {
            self.last_updated_from_display = java_timestamp(timestamp);
        }
        if let Some(timestamp) = update.server_time {
            self.server_time = java_timestamp(timestamp);
        }
        self.last_updated = Some(now);
    }
}

/// Wire shape of a full or partial status document, as returned by the
/// status endpoint and pushed on the live update channel.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusUpdate {
    pub(crate) thermostat_info: Option<ThermostatUpdate>,
    pub(crate) power_usage: Option<PowerUsageUpdate>,
    pub(crate) gas_usage: Option<GasUsageUpdate>,
    pub(crate) water_usage: Option<WaterUsageUpdate>,
    pub(crate) last_update_from_display: Option<i64>,
    pub(crate) server_time: Option<i64>,
}

// ============================================================================
// Unit conversions
// ============================================================================

/// Centi-degrees to degrees Celsius.
fn centi_degrees(value: f64) -> f64 {
    value / 100.0
}

/// Wh to kWh, rounded to two decimals.
fn watt_hours(value: f64) -> f64 {
    round_to(value / 1000.0, 2)
}

/// cm3 to m3, rounded to two decimals.
fn cubic_centimeters(value: f64) -> f64 {
    round_to(value / 1000.0, 2)
}

/// Liters per hour to liters per minute, rounded to one decimal.
fn liters_per_minute(value: f64) -> f64 {
    round_to(value / 60.0, 1)
}

/// Java millisecond timestamp to UTC datetime.
fn java_timestamp(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Negative vendor sentinels mean "not set".
fn non_negative(value: i64) -> Option<i64> {
    (value >= 0).then_some(value)
}

fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Bool(b) => Some(b),
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }))
}

fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }))
}
