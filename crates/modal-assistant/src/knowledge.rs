//! Static knowledge base. Order matters: lookups return the first match.

pub struct Concept {
    pub name: &'static str,
    pub definition: &'static str,
    pub explanation: &'static str,
    pub examples: &'static [&'static str],
}

pub struct Calculation {
    pub name: &'static str,
    pub explanation: &'static str,
    pub steps: &'static [&'static str],
    pub example: &'static str,
}

pub struct CommonQuestion {
    pub question: &'static str,
    pub answer: &'static str,
}

pub const CONCEPTS: &[Concept] = &[
    Concept {
        name: "modal realism",
        definition: "Modal realism is the philosophical view that possible worlds are as real as the actual world.",
        explanation: "In modal realism, when we say \"it is possible that P,\" we mean that there is a world where P is true.",
        examples: &["The world where I am a doctor", "The world where gravity is stronger"],
    },
    Concept {
        name: "possible worlds",
        definition: "Possible worlds are complete ways things might have been.",
        explanation: "Each possible world is a maximal consistent set of propositions - a complete description of how things could be.",
        examples: &["World where dinosaurs still exist", "World where humans never evolved"],
    },
    Concept {
        name: "extended modal realism",
        definition: "Yagisawa's extended modal realism treats possible worlds as concrete entities in a modal dimension.",
        explanation: "Unlike Lewis's modal realism, extended modal realism allows for worlds to have mathematical relationships and correspondences.",
        examples: &["Prime numbers representing fundamental worlds", "Mathematical operations between worlds"],
    },
    Concept {
        name: "perdurantism",
        definition: "Perdurantism is the view that objects persist through time by having temporal parts.",
        explanation: "Objects are extended in time like they are extended in space, with different temporal parts at different times.",
        examples: &[
            "A person has different temporal parts at different ages",
            "A table has different temporal parts as it ages",
        ],
    },
    Concept {
        name: "causality",
        definition: "Causality is the relationship between cause and effect.",
        explanation: "In modal contexts, causality involves counterfactual dependence - if the cause hadn't occurred, the effect wouldn't have occurred.",
        examples: &[
            "If I hadn't dropped the ball, it wouldn't have fallen",
            "If the sun hadn't risen, it wouldn't be light",
        ],
    },
];

pub const CALCULATIONS: &[Calculation] = &[
    Calculation {
        name: "prime factorization",
        explanation: "Prime factorization breaks down a number into its prime components.",
        steps: &[
            "Start with the smallest prime number (2)",
            "Divide the number by 2 as many times as possible",
            "Move to the next prime number and repeat",
            "Continue until the number is 1",
        ],
        example: "12 = 2² × 3",
    },
    Calculation {
        name: "world size calculation",
        explanation: "In extended modal realism, world size is calculated as 1/n where n is the associated number.",
        steps: &[
            "Take the input number",
            "Calculate 1/n",
            "This represents the \"size\" of the possible world",
            "Smaller numbers correspond to larger worlds",
        ],
        example: "World 3 has size 1/3 ≈ 0.333",
    },
    Calculation {
        name: "probability calculation",
        explanation: "The probability of a world is equal to its size in the modal dimension.",
        steps: &[
            "Calculate world size (1/n)",
            "This directly gives the probability",
            "Higher probability = more likely world",
            "Lower probability = less likely world",
        ],
        example: "World 2 has probability 0.5, World 3 has probability 0.333",
    },
];

pub const COMMON_QUESTIONS: &[CommonQuestion] = &[
    CommonQuestion {
        question: "what is modal realism",
        answer: "Modal realism is the philosophical view that possible worlds are as real as the actual world. It was developed by philosophers like David Lewis and Takashi Yagisawa.",
    },
    CommonQuestion {
        question: "how do you calculate world size",
        answer: "World size is calculated as 1/n where n is the number. This creates an inverse relationship where smaller numbers correspond to larger worlds.",
    },
    CommonQuestion {
        question: "what is the difference between prime and composite worlds",
        answer: "Prime worlds are fundamental - they cannot be broken down further. Composite worlds are combinations of fundamental worlds.",
    },
    CommonQuestion {
        question: "why use prime numbers",
        answer: "Prime numbers represent fundamental possible worlds because they cannot be decomposed into smaller components, making them the \"atoms\" of modal space.",
    },
];

pub fn calculation(name: &str) -> Option<&'static Calculation> {
    CALCULATIONS.iter().find(|c| c.name == name)
}
