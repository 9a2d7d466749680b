//! Color thresholds used by the card gauges.

pub const ONLINE_DOT_COLOR: &str = "#4be34b";
pub const OFFLINE_DOT_COLOR: &str = "#dc3545";
pub const MEMORY_SLICE_COLOR: &str = "#ffc107";
pub const REMAINDER_SLICE_COLOR: &str = "#6c757d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureLevel {
    Danger,
    Warning,
    Primary,
    Info,
}

impl TemperatureLevel {
    pub fn classify(celsius: f64) -> Self {
        if celsius >= 70.0 {
            TemperatureLevel::Danger
        } else if celsius >= 50.0 {
            TemperatureLevel::Warning
        } else if celsius >= 40.0 {
            TemperatureLevel::Primary
        } else {
            TemperatureLevel::Info
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            TemperatureLevel::Danger => "bg-danger",
            TemperatureLevel::Warning => "bg-warning text-dark",
            TemperatureLevel::Primary => "bg-primary",
            TemperatureLevel::Info => "bg-info text-dark",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanSpeedLevel {
    Danger,
    Success,
    Subtle,
}

impl FanSpeedLevel {
    pub fn classify(percent: i64) -> Self {
        if percent >= 80 {
            FanSpeedLevel::Danger
        } else if percent >= 25 {
            FanSpeedLevel::Success
        } else {
            FanSpeedLevel::Subtle
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            FanSpeedLevel::Danger => "bg-danger",
            FanSpeedLevel::Success => "bg-success",
            FanSpeedLevel::Subtle => "bg-purple-subtle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuAccent {
    Red,
    Amber,
    Blue,
}

impl CpuAccent {
    pub fn classify(percent: f64) -> Self {
        if percent >= 75.0 {
            CpuAccent::Red
        } else if percent >= 50.0 {
            CpuAccent::Amber
        } else {
            CpuAccent::Blue
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            CpuAccent::Red => "#dc3545",
            CpuAccent::Amber => "#ffc107",
            CpuAccent::Blue => "#0d6efd",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_levels() {
        assert_eq!(TemperatureLevel::classify(72.0), TemperatureLevel::Danger);
        assert_eq!(TemperatureLevel::classify(70.0), TemperatureLevel::Danger);
        assert_eq!(TemperatureLevel::classify(55.0), TemperatureLevel::Warning);
        assert_eq!(TemperatureLevel::classify(42.0), TemperatureLevel::Primary);
        assert_eq!(TemperatureLevel::classify(39.9), TemperatureLevel::Info);
        assert_eq!(TemperatureLevel::classify(20.0), TemperatureLevel::Info);
    }

    #[test]
    fn test_fan_speed_levels() {
        assert_eq!(FanSpeedLevel::classify(85), FanSpeedLevel::Danger);
        assert_eq!(FanSpeedLevel::classify(30), FanSpeedLevel::Success);
        assert_eq!(FanSpeedLevel::classify(25), FanSpeedLevel::Success);
        assert_eq!(FanSpeedLevel::classify(10), FanSpeedLevel::Subtle);
        assert_eq!(FanSpeedLevel::Subtle.css_class(), "bg-purple-subtle");
    }

    #[test]
    fn test_cpu_accent() {
        assert_eq!(CpuAccent::classify(80.0).color(), "#dc3545");
        assert_eq!(CpuAccent::classify(60.0).color(), "#ffc107");
        assert_eq!(CpuAccent::classify(30.0).color(), "#0d6efd");
        assert_eq!(CpuAccent::classify(75.0), CpuAccent::Red);
        assert_eq!(CpuAccent::classify(50.0), CpuAccent::Amber);
    }
}
