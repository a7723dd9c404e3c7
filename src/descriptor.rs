use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{Error, Result};

/// 主色调，每个颜色固定 3 个通道
pub type Color = [f32; 3];

/// 四种描述符类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
    /// 主色调
    DominantColors,
    /// 颜色直方图
    ColorHistogram,
    /// Gabor 纹理特征
    GaborFeatures,
    /// Hu 不变矩
    HuMoments,
}

impl DescriptorKind {
    pub const ALL: [DescriptorKind; 4] =
        [Self::DominantColors, Self::ColorHistogram, Self::GaborFeatures, Self::HuMoments];

    /// 按分量比较的定长向量类描述符
    pub const VECTORS: [DescriptorKind; 3] =
        [Self::ColorHistogram, Self::GaborFeatures, Self::HuMoments];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DominantColors => "dominant_colors",
            Self::ColorHistogram => "color_histogram",
            Self::GaborFeatures => "gabor_features",
            Self::HuMoments => "hu_moments",
        }
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一张图片的全部描述符，缺失的类型在打分时直接跳过
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_colors: Option<Vec<Color>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_histogram: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gabor_features: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hu_moments: Option<Vec<f32>>,
}

impl DescriptorSet {
    /// 返回定长向量类描述符，`DominantColors` 始终返回 `None`
    pub fn vector(&self, kind: DescriptorKind) -> Option<&[f32]> {
        match kind {
            DescriptorKind::DominantColors => None,
            DescriptorKind::ColorHistogram => self.color_histogram.as_deref(),
            DescriptorKind::GaborFeatures => self.gabor_features.as_deref(),
            DescriptorKind::HuMoments => self.hu_moments.as_deref(),
        }
    }

    /// 检查两组描述符中定长向量的长度是否一致
    ///
    /// 主色调的颜色数量允许不同，不参与检查
    pub fn check_lengths(&self, reference: &DescriptorSet) -> Result<()> {
        for kind in DescriptorKind::VECTORS {
            if let (Some(actual), Some(expected)) = (self.vector(kind), reference.vector(kind)) {
                if actual.len() != expected.len() {
                    return Err(Error::DescriptorLength {
                        kind,
                        expected: expected.len(),
                        actual: actual.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// 相关反馈得到的权重配置
///
/// 每种描述符要么没有权重（不加权打分），要么是与描述符等长的分量权重。
/// 主色调的权重按 (颜色, 通道) 计算，但打分时只作为是否参与聚合比较的依据。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_colors: Option<Vec<Color>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_histogram: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gabor_features: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hu_moments: Option<Vec<f32>>,
}

impl Weights {
    pub fn vector(&self, kind: DescriptorKind) -> Option<&[f32]> {
        match kind {
            DescriptorKind::DominantColors => None,
            DescriptorKind::ColorHistogram => self.color_histogram.as_deref(),
            DescriptorKind::GaborFeatures => self.gabor_features.as_deref(),
            DescriptorKind::HuMoments => self.hu_moments.as_deref(),
        }
    }

    pub(crate) fn vector_mut(&mut self, kind: DescriptorKind) -> Option<&mut Option<Vec<f32>>> {
        match kind {
            DescriptorKind::DominantColors => None,
            DescriptorKind::ColorHistogram => Some(&mut self.color_histogram),
            DescriptorKind::GaborFeatures => Some(&mut self.gabor_features),
            DescriptorKind::HuMoments => Some(&mut self.hu_moments),
        }
    }

    /// 配置了权重的描述符类型
    pub fn kinds(&self) -> Vec<DescriptorKind> {
        DescriptorKind::ALL
            .into_iter()
            .filter(|&kind| match kind {
                DescriptorKind::DominantColors => self.dominant_colors.is_some(),
                _ => self.vector(kind).is_some(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_extractor_output() {
        let json = r#"{
            "color_histogram": [0.5, 0.25],
            "dominant_colors": [[12.0, 40.5, 200.0], [0.0, 0.0, 0.0]],
            "gabor_features": [1.0, 2.0, 3.0, 4.0],
            "hu_moments": [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]
        }"#;
        let set: DescriptorSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.color_histogram.as_deref(), Some(&[0.5, 0.25][..]));
        assert_eq!(set.dominant_colors.as_ref().map(Vec::len), Some(2));
        assert_eq!(set.vector(DescriptorKind::HuMoments).map(<[f32]>::len), Some(7));
        assert_eq!(set.vector(DescriptorKind::DominantColors), None);
    }

    #[test]
    fn test_missing_kinds_are_none() {
        let set: DescriptorSet = serde_json::from_str(r#"{"hu_moments": [1.0]}"#).unwrap();
        assert!(set.color_histogram.is_none());
        assert!(set.dominant_colors.is_none());
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"{"hu_moments":[1.0]}"#);
    }

    #[test]
    fn test_check_lengths() {
        let a = DescriptorSet { hu_moments: Some(vec![1.0, 2.0, 3.0]), ..Default::default() };
        let b = DescriptorSet {
            hu_moments: Some(vec![1.0, 2.0]),
            dominant_colors: Some(vec![[0.0; 3]]),
            ..Default::default()
        };
        let err = a.check_lengths(&b).unwrap_err();
        assert!(matches!(
            err,
            Error::DescriptorLength { kind: DescriptorKind::HuMoments, expected: 2, actual: 3 }
        ));

        // 主色调数量不同不算错误
        let c = DescriptorSet {
            dominant_colors: Some(vec![[0.0; 3], [1.0; 3]]),
            ..Default::default()
        };
        assert!(c.check_lengths(&b).is_ok());
    }

    #[test]
    fn test_weights_kinds() {
        let mut weights = Weights::default();
        assert!(weights.is_empty());
        weights.hu_moments = Some(vec![0.5]);
        weights.dominant_colors = Some(vec![[0.1, 0.2, 0.3]]);
        assert_eq!(weights.kinds(), vec![DescriptorKind::DominantColors, DescriptorKind::HuMoments]);
    }
}
