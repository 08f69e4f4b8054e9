//! Performance-metrics helper.
//!
//! The platform's collector answers a batched query with flat parallel
//! arrays; this module reshapes them into one structured record per metric,
//! with a pre-formatted display string external reporting tools rely on.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GlueError, Result};
use crate::object::ObjectRef;
use crate::style::Style;
use crate::value::Value;

/// One metric's worth of query results. The stable external contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Metric name, as resolved by the backend.
    pub name: String,
    /// Managed object the metric is associated with.
    pub object: String,
    /// Unit of measurement.
    pub unit: String,
    /// Divide `values` by this to get real numbers; always >= 1.
    pub scale: i64,
    /// Collected raw samples.
    pub values: Vec<i64>,
    /// Samples pre-formatted for display.
    pub values_as_string: String,
}

/// Wrapper over the platform's performance collector.
///
/// Begin collection with [`PerfCollector::setup`]; fetch collected data with
/// [`PerfCollector::query`]. Collection can be suspended and resumed without
/// touching the collection parameters via `disable`/`enable`.
pub struct PerfCollector {
    collector: ObjectRef,
    /// The COM transport echoes the query's input arrays back in the output;
    /// they are discarded in favor of the canonical resolved pair.
    duplicate_input_arrays: bool,
}

impl PerfCollector {
    pub(crate) fn new(root: &ObjectRef, style: Style) -> Result<PerfCollector> {
        let handle = root.get("performanceCollector")?.as_object()?;
        Ok(PerfCollector {
            collector: root.sibling(handle),
            duplicate_input_arrays: style == Style::Com,
        })
    }

    fn filter_args(names: &[&str], objects: &[&ObjectRef]) -> [Value; 2] {
        [
            Value::Array(names.iter().map(|n| Value::from(*n)).collect()),
            Value::Array(objects.iter().map(|o| Value::Object(o.handle())).collect()),
        ]
    }

    /// Discard previously collected values for the given metrics, set the
    /// collection period (seconds) and retained sample count, and enable
    /// collection.
    pub fn setup(
        &self,
        names: &[&str],
        objects: &[&ObjectRef],
        period: u32,
        samples: u32,
    ) -> Result<()> {
        let [names, objects] = Self::filter_args(names, objects);
        self.collector.call(
            "setupMetrics",
            &[names, objects, Value::Int(period as i64), Value::Int(samples as i64)],
        )?;
        Ok(())
    }

    /// Resume collection for the given metrics.
    pub fn enable(&self, names: &[&str], objects: &[&ObjectRef]) -> Result<()> {
        let args = Self::filter_args(names, objects);
        self.collector.call("enableMetrics", &args)?;
        Ok(())
    }

    /// Suspend collection for the given metrics.
    pub fn disable(&self, names: &[&str], objects: &[&ObjectRef]) -> Result<()> {
        let args = Self::filter_args(names, objects);
        self.collector.call("disableMetrics", &args)?;
        Ok(())
    }

    /// Retrieve collected values, one record per metric, in the order the
    /// backend returned them (not necessarily the caller's order).
    pub fn query(&self, names: &[&str], objects: &[&ObjectRef]) -> Result<Vec<MetricRecord>> {
        let args = Self::filter_args(names, objects);
        let arrays = self.collector.call("queryMetricsData", &args)?.into_array()?;

        let expected = if self.duplicate_input_arrays { 10 } else { 8 };
        if arrays.len() != expected {
            return Err(GlueError::Transport(format!(
                "queryMetricsData returned {} arrays, expected {}",
                arrays.len(),
                expected
            )));
        }

        let mut arrays = arrays.into_iter();
        let mut next = || -> Result<Vec<Value>> {
            arrays
                .next()
                .ok_or_else(|| GlueError::Internal("array count already checked".to_string()))?
                .into_array()
        };

        let values = ints(next()?)?;
        if self.duplicate_input_arrays {
            let _echoed_names = next()?;
            let _echoed_objects = next()?;
        }
        let names_out = strings(next()?)?;
        let objects_out = strings(next()?)?;
        let units = strings(next()?)?;
        let scales = ints(next()?)?;
        let _sequence_numbers = ints(next()?)?;
        let indices = ints(next()?)?;
        let lengths = ints(next()?)?;

        let count = names_out.len();
        if [objects_out.len(), units.len(), scales.len(), indices.len(), lengths.len()]
            .iter()
            .any(|&len| len != count)
        {
            return Err(GlueError::Transport(
                "queryMetricsData arrays disagree on metric count".to_string(),
            ));
        }

        let mut records = Vec::with_capacity(count);
        for i in 0..count {
            let scale = scales[i];
            if scale < 1 {
                return Err(GlueError::Transport(format!(
                    "invalid scale {} for metric '{}'",
                    scale, names_out[i]
                )));
            }
            let start = usize::try_from(indices[i]).map_err(|_| {
                GlueError::Transport(format!("negative index for metric '{}'", names_out[i]))
            })?;
            let len = usize::try_from(lengths[i]).map_err(|_| {
                GlueError::Transport(format!("negative length for metric '{}'", names_out[i]))
            })?;
            let slice = values
                .get(start..start + len)
                .ok_or_else(|| {
                    GlueError::Transport(format!(
                        "metric '{}' slice [{}, {}) out of range",
                        names_out[i],
                        start,
                        start + len
                    ))
                })?
                .to_vec();

            records.push(MetricRecord {
                values_as_string: display_string(&slice, scale, &units[i]),
                name: names_out[i].clone(),
                object: objects_out[i].clone(),
                unit: units[i].clone(),
                scale,
                values: slice,
            });
        }
        debug!(metrics = records.len(), "Reshaped metrics query");
        Ok(records)
    }
}

/// Display formatting: two decimals without a space when the values need
/// scaling, plain integers with a space otherwise.
fn display_string(values: &[i64], scale: i64, unit: &str) -> String {
    let parts: Vec<String> = values
        .iter()
        .map(|v| {
            if scale != 1 {
                format!("{:.2}{}", *v as f64 / scale as f64, unit)
            } else {
                format!("{} {}", v, unit)
            }
        })
        .collect();
    format!("[{}]", parts.join(", "))
}

fn ints(values: Vec<Value>) -> Result<Vec<i64>> {
    values.iter().map(Value::as_i64).collect()
}

fn strings(values: Vec<Value>) -> Result<Vec<String>> {
    values
        .into_iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{Bridge, ConnectParams};
    use crate::manager::Manager;
    use crate::mock::MockBridge;
    use crate::style::HostOs;
    use std::sync::Arc;

    #[test]
    fn unscaled_values_format_as_integers() {
        assert_eq!(display_string(&[100, 250], 1, "%"), "[100 %, 250 %]");
    }

    #[test]
    fn scaled_values_format_with_two_decimals() {
        assert_eq!(display_string(&[100, 250], 10, "MB"), "[10.00MB, 25.00MB]");
    }

    fn manager_for(bridge: Arc<MockBridge>, style: Style) -> Manager {
        Manager::with_host(
            Some(style),
            ConnectParams::default(),
            bridge as Arc<dyn Bridge>,
            HostOs::Unix,
        )
        .unwrap()
    }

    #[test]
    fn query_reshapes_parallel_arrays() {
        let bridge = Arc::new(MockBridge::new());
        bridge.register_metric("CPU/Load/User", "host", "%", 1, &[100, 250]);
        bridge.register_metric("RAM/Usage/Used", "host", "MB", 10, &[100, 250]);

        let mgr = manager_for(Arc::clone(&bridge), Style::Xpcom);
        let perf = mgr.perf_collector().unwrap();
        perf.setup(&["*"], &[], 1, 5).unwrap();
        let records = perf.query(&["*"], &[]).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "CPU/Load/User");
        assert_eq!(records[0].values, vec![100, 250]);
        assert_eq!(records[0].values_as_string, "[100 %, 250 %]");
        assert_eq!(records[1].scale, 10);
        assert_eq!(records[1].values_as_string, "[10.00MB, 25.00MB]");
    }

    #[test]
    fn com_variant_discards_echoed_input_arrays() {
        let bridge = Arc::new(MockBridge::com());
        bridge.register_metric("Disk/Usage/Used", "vm-1", "mB", 1000, &[1500]);

        let mgr = manager_for(Arc::clone(&bridge), Style::Com);
        let perf = mgr.perf_collector().unwrap();
        let records = perf.query(&["Disk/Usage/Used"], &[]).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].object, "vm-1");
        assert_eq!(records[0].values_as_string, "[1.50mB]");
    }

    #[test]
    fn records_serialize_for_external_reporting() {
        let record = MetricRecord {
            name: "CPU/Load/User".to_string(),
            object: "host".to_string(),
            unit: "%".to_string(),
            scale: 1,
            values: vec![100],
            values_as_string: "[100 %]".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"values_as_string\":\"[100 %]\""));
        let back: MetricRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn disabled_metrics_drop_out_of_the_query() {
        let bridge = Arc::new(MockBridge::new());
        bridge.register_metric("Net/Rate/Rx", "vm-2", "B/s", 1, &[10]);

        let mgr = manager_for(Arc::clone(&bridge), Style::Xpcom);
        let perf = mgr.perf_collector().unwrap();
        perf.disable(&["Net/Rate/Rx"], &[]).unwrap();
        assert!(perf.query(&["*"], &[]).unwrap().is_empty());
        perf.enable(&["Net/Rate/Rx"], &[]).unwrap();
        assert_eq!(perf.query(&["*"], &[]).unwrap().len(), 1);
    }
}
