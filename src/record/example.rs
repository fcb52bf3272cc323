use tfrecord::{Example, Feature};

pub const IMAGE_KEY: &str = "image";
pub const LABEL_KEY: &str = "label";

/// Typed lookups for the `{image, label}` features of an `Example`.
pub trait ExampleExt {
    fn feature(&self, key: &str) -> Option<&Feature>;

    /// The value of a bytes feature holding exactly one entry.
    fn single_bytes(&self, key: &str) -> Option<&[u8]> {
        match self.feature(key)?.as_bytes_list()? {
            [value] => Some(value.as_slice()),
            _ => None,
        }
    }

    /// The value of an int64 feature holding exactly one entry.
    fn single_int64(&self, key: &str) -> Option<i64> {
        match self.feature(key)?.as_i64_list()? {
            [value] => Some(*value),
            _ => None,
        }
    }
}

impl ExampleExt for Example {
    fn feature(&self, key: &str) -> Option<&Feature> {
        self.features.as_ref()?.feature.get(key)
    }
}

/// Builds the two-field `{image, label}` record the input pipeline reads.
pub fn image_example(image: Vec<u8>, label: i64) -> Example {
    [
        (IMAGE_KEY.to_string(), Feature::from_bytes_iter([image])),
        (LABEL_KEY.to_string(), Feature::from_i64_iter([label])),
    ]
    .into_iter()
    .collect()
}
