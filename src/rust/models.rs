/// Output labels of the anime title model, in the order of the model's output units.
pub const ANIME_TITLES: [&str; 30] = [
    "A Place Further Than The Universe",
    "A Silent Voice",
    "Angel Beats!",
    "Attack on Titan",
    "Bakemonogatari",
    "Chihayafuru",
    "Clannad",
    "Code Geass",
    "Death Note",
    "Death Parade",
    "Haikyu!!",
    "Hunter x Hunter",
    "Hyouka",
    "Kamisama Kiss",
    "Laid-Back Camp",
    "Maid Sama!",
    "My Teen Romantic Comedy",
    "Nana",
    "Neon Genesis Evangelion",
    "Nichijou",
    "No Game No Life",
    "Ping Pong the Animation",
    "ReLife",
    "ReZero",
    "Sound! Euphonium",
    "Steins Gate",
    "Tsukigakirei",
    "Violet Evergarden",
    "Yona of the Dawn",
    "Your Lie in April",
];

/// Represents the available built-in models in the library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModel {
    /// ResNet-50 backbone whose ImageNet head is replaced by
    /// `Linear(2048, 256) -> ReLU -> Dropout(0.4) -> Linear(256, 30)`,
    /// fine-tuned on screenshots of 30 anime titles.
    ///
    /// Characteristics:
    /// - Input: 3x224x224, ImageNet normalization
    /// - Output: 30 raw class scores
    /// - Size: ~95MB
    AnimeResNet50,
}

/// Characteristics of a model: its topology and the preprocessing its weights were trained with.
///
/// The preprocessing values are part of the model contract. Serving the weights with
/// different values does not fail, it silently produces wrong predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCharacteristics {
    /// Name of the pretrained backbone
    pub backbone: &'static str,
    /// Width of the pooled feature vector the backbone feeds into the head
    pub feature_size: usize,
    /// Width of the hidden layer of the replacement head
    pub head_hidden_size: usize,
    /// Dropout probability of the head (inactive at inference)
    pub head_dropout: f32,
    /// Number of output classes
    pub num_classes: usize,
    /// Side of the square crop the network consumes
    pub input_size: u32,
    /// Length the shorter image side is resized to before cropping
    pub resize_size: u32,
    /// Per-channel normalization mean (RGB)
    pub mean: [f32; 3],
    /// Per-channel normalization standard deviation (RGB)
    pub std: [f32; 3],
}

impl BuiltinModel {
    /// Get the characteristics of the model
    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            Self::AnimeResNet50 => ModelCharacteristics {
                backbone: "resnet50",
                feature_size: 2048,
                head_hidden_size: 256,
                head_dropout: 0.4,
                num_classes: ANIME_TITLES.len(),
                input_size: 224,
                resize_size: 256,
                mean: [0.485, 0.456, 0.406],
                std: [0.229, 0.224, 0.225],
            },
        }
    }

    /// Class labels in model-output order
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Self::AnimeResNet50 => &ANIME_TITLES,
        }
    }

    /// Paths of the model file and metadata dataset, relative to the install root
    pub fn get_paths(&self) -> (&'static str, &'static str) {
        match self {
            Self::AnimeResNet50 => ("models/trained_resnet50_final.onnx", "data/anime.csv"),
        }
    }
}
