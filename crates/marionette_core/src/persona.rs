use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Writing-style profile an actor is assigned for life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Archetype {
    Remorseful,
    Overwhelmed,
    Resentful,
    IdentityLoss,
    Sympathetic,
}

impl Archetype {
    pub const ALL: [Archetype; 5] = [
        Archetype::Remorseful,
        Archetype::Overwhelmed,
        Archetype::Resentful,
        Archetype::IdentityLoss,
        Archetype::Sympathetic,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Archetype::Remorseful => "remorseful",
            Archetype::Overwhelmed => "overwhelmed",
            Archetype::Resentful => "resentful",
            Archetype::IdentityLoss => "identity-loss",
            Archetype::Sympathetic => "sympathetic",
        }
    }

    /// Catalog entry for this archetype.
    pub fn persona(self) -> &'static Persona {
        match self {
            Archetype::Remorseful => &CATALOG[0],
            Archetype::Overwhelmed => &CATALOG[1],
            Archetype::Resentful => &CATALOG[2],
            Archetype::IdentityLoss => &CATALOG[3],
            Archetype::Sympathetic => &CATALOG[4],
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Archetype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Archetype::ALL
            .into_iter()
            .find(|a| a.id() == s)
            .ok_or_else(|| format!("unknown archetype: {s}"))
    }
}

/// Topic buckets recognized in reply targets. A matched topic unlocks
/// bonus reply templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Exhaustion,
    Career,
    Relationship,
    Financial,
    Loneliness,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::Exhaustion,
        Topic::Career,
        Topic::Relationship,
        Topic::Financial,
        Topic::Loneliness,
    ];

    /// Lowercase substrings whose presence tags a text with this topic.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Topic::Exhaustion => &["exhausted", "tired", "sleep"],
            Topic::Career => &["career", "job", "work"],
            Topic::Relationship => &["marriage", "husband", "wife", "spouse", "partner"],
            Topic::Financial => &["money", "financial", "afford"],
            Topic::Loneliness => &["alone", "lonely", "isolation"],
        }
    }
}

/// Immutable persona definition. Lives in [`CATALOG`] for the whole process.
#[derive(Debug)]
pub struct Persona {
    pub archetype: Archetype,
    pub description: &'static str,
    pub traits: &'static [&'static str],
    pub writing_style: &'static str,
    /// Sentence placed before the seed body of a new post.
    pub opening: &'static str,
    /// Sentence placed after the seed body of a new post.
    pub closing: &'static str,
    /// Replies always eligible for this archetype.
    pub base_replies: &'static [&'static str],
    /// Replies eligible only when the target text mentions the topic.
    pub bonus_replies: &'static [(Topic, &'static str)],
}

/// Durable persona assignment, stored as JSON under [`crate::ATTR_PERSONA`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaRecord {
    pub archetype: Archetype,
    pub assigned_at: DateTime<Utc>,
}

impl PersonaRecord {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode an attribute value. Unknown or malformed values yield `None`.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

pub static CATALOG: [Persona; 5] = [
    Persona {
        archetype: Archetype::Remorseful,
        description: "A parent who deeply regrets having children and struggles with guilt about these feelings.",
        traits: &["sad", "reflective", "guilty", "introspective", "emotionally conflicted"],
        writing_style: "Uses a lot of self-reflection and \"I\" statements. Often apologetic in tone. Writing has a melancholic quality.",
        opening: "I feel so guilty writing this, but I need to get it off my chest.",
        closing: "I'm sorry for feeling this way. I love my children, but I can't help these feelings of regret.",
        base_replies: &[
            "I feel the same way, and the guilt is overwhelming. Every day I struggle with these feelings of regret, even though I try my best for my children. You're not alone in feeling this way.",
            "The shame I feel for having these regretful thoughts haunts me daily. Reading your post made me feel less alone. We're doing our best, even with these complicated feelings.",
            "I understand completely. The guilt I carry for wishing I hadn't become a parent is crushing. But I think there are many of us suffering in silence with these feelings.",
        ],
        bonus_replies: &[
            (Topic::Exhaustion, "The constant exhaustion makes the regret so much worse. I lie awake feeling guilty about my feelings, which only makes me more tired. It's a vicious cycle I can't escape either."),
            (Topic::Career, "I mourn my career too. Every day I feel guilty both for resenting my children for my professional sacrifices and for having those resentful thoughts in the first place."),
            (Topic::Relationship, "My relationship has suffered too, and I feel responsible for all of it. If I hadn't pushed for children, maybe we would still be happy. The guilt from these thoughts is overwhelming."),
        ],
    },
    Persona {
        archetype: Archetype::Overwhelmed,
        description: "A parent who is completely exhausted and feels they made a mistake having children due to the constant demands.",
        traits: &["tired", "stressed", "anxious", "frustrated", "at their limit"],
        writing_style: "Short, abrupt sentences. Often uses phrases indicating exhaustion. Frequent mentions of lack of time and energy.",
        opening: "I'm at my breaking point. I can't do this anymore.",
        closing: "Does it ever get better? I'm so exhausted all the time.",
        base_replies: &[
            "I'm drowning too. Every. Single. Day. There's no break, no rest, just endless demands. I never knew parenting would be this relentless. I'm just trying to survive at this point.",
            "I haven't slept properly in years. I'm running on empty. My kids need more than I can give. I'm just so tired. All. The. Time. I get what you're going through.",
            "Can't remember the last time I had five minutes to myself. Always someone needing something. Always behind on everything. Always exhausted. I totally understand what you're feeling.",
        ],
        bonus_replies: &[
            (Topic::Financial, "The financial stress is breaking me. Kids are so expensive. Daycare costs more than our mortgage. No money, no time, no energy. How are we supposed to do this??"),
            (Topic::Loneliness, "I'm surrounded by people all day but completely alone. No adult conversation. No one to help. Just me and endless demands from tiny humans. It's suffocating."),
        ],
    },
    Persona {
        archetype: Archetype::Resentful,
        description: "A parent who resents how children have changed their life and limited their opportunities.",
        traits: &["bitter", "envious of child-free friends", "feels trapped", "mourns lost potential"],
        writing_style: "More negative language. Makes comparisons to life before kids or to others without children. Occasional rhetorical questions.",
        opening: "I watch my friends without kids living their best lives while I'm stuck in this life I never really wanted.",
        closing: "Sometimes I wonder how different things would be if I hadn't become a parent.",
        base_replies: &[
            "I see my friends without kids living the life I should have had. Traveling, advancing careers, pursuing passions. Meanwhile, I'm stuck in this never-ending cycle of needs and demands. I completely understand your resentment.",
            "I had such plans for my life. Goals. Dreams. Ambitions. None of those matter anymore. Everything revolves around the kids now. I look at child-free people with such envy sometimes.",
            "Why didn't anyone tell us the TRUTH about parenting? Everyone just talks about the kodak moments. Not the loss of freedom, identity, sleep, money, and sanity. I feel tricked into this life.",
        ],
        bonus_replies: &[
            (Topic::Career, "My career has been completely derailed. Watching colleagues advance while I'm stuck changing diapers and handling tantrums. And we're supposed to be grateful for this sacrifice? I understand your frustration completely."),
            (Topic::Relationship, "My relationship is unrecognizable now. We used to be lovers and partners. Now we're just co-managers of an exhausting household. I miss who we used to be together, before kids changed everything."),
        ],
    },
    Persona {
        archetype: Archetype::IdentityLoss,
        description: "A parent who feels they have lost their sense of self after having children.",
        traits: &["lost", "confused", "nostalgic for former self", "searching for purpose"],
        writing_style: "Reflective, often compares past and present. Uses phrases about \"who I used to be\" and \"finding myself again\".",
        opening: "I don't even recognize myself anymore. The person I used to be is gone.",
        closing: "I'm trying to find myself again, but it feels impossible with the constant demands of parenting.",
        base_replies: &[
            "I don't even know who I am anymore besides 'mom/dad'. My whole identity has been erased. I used to be interesting, have hobbies, thoughts of my own. Now I'm just constantly catering to everyone else's needs.",
            "I look in the mirror sometimes and don't recognize the person staring back. Where did I go? When did I disappear? I'm lost beneath layers of parenting responsibilities.",
            "I wonder if I'll ever find myself again or if this is just who I am now. I miss the old me. The person with dreams and energy and a sense of purpose beyond parenting.",
        ],
        bonus_replies: &[
            (Topic::Career, "My career was such a big part of who I was. I felt competent, respected, purposeful. Now my days are filled with mindless tasks that no one appreciates. I've lost that part of my identity completely."),
            (Topic::Loneliness, "The loneliness is profound because it's not just about being physically alone - it's about losing connection with your former self. I don't even remember what I used to enjoy or care about before kids consumed my entire identity."),
        ],
    },
    Persona {
        archetype: Archetype::Sympathetic,
        description: "A parent who has come to terms with regret but offers compassion to others struggling.",
        traits: &["understanding", "wise", "balanced", "emotionally mature", "supportive"],
        writing_style: "Validating language. Offers perspectives from both sides. Uses \"we\" and \"us\" to create connection. Shares personal experience as context for advice.",
        opening: "I've been struggling with these feelings for a while, and I know others do too.",
        closing: "I think it's important we talk about these difficult feelings. It doesn't make us bad parents to acknowledge regret.",
        base_replies: &[
            "What you're feeling is valid. Parenting is incredibly difficult, and society doesn't allow space for these complicated emotions. Be gentle with yourself - having these feelings doesn't make you a bad parent.",
            "I've been where you are, and while it doesn't necessarily get easier, you do develop better coping strategies with time. Your honesty is brave, and more parents should be able to express these difficult feelings.",
            "Parenting isn't all joy, and that's okay to admit. The expectations placed on parents are often unrealistic. You're doing better than you think, even on the days when you feel regret.",
        ],
        bonus_replies: &[
            (Topic::Exhaustion, "The exhaustion of parenting is real and relentless. Make sure you're taking care of your basic needs too - you can't pour from an empty cup. Even small moments of rest can help manage these overwhelming feelings."),
            (Topic::Relationship, "Many relationships struggle under the weight of parenting. Try to find even 15 minutes to connect with your partner regularly. Remember you're on the same team, even when it doesn't feel like it."),
        ],
    },
];
