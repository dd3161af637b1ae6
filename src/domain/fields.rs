//! Human-facing labels and help texts for model fields.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    pub name: &'static str,
    pub label: &'static str,
    pub help_text: &'static str,
}

pub const POST_TEXT: FieldMeta = FieldMeta {
    name: "text",
    label: "Post text",
    help_text: "Enter the text of the post",
};

pub const POST_GROUP: FieldMeta = FieldMeta {
    name: "group",
    label: "Group",
    help_text: "Choose the group for the post",
};

pub const POST_IMAGE: FieldMeta = FieldMeta {
    name: "image",
    label: "Image",
    help_text: "Attach an image to the post",
};

pub const POST_PUB_DATE: FieldMeta = FieldMeta {
    name: "pub_date",
    label: "Publication date",
    help_text: "",
};

pub const POST_AUTHOR: FieldMeta = FieldMeta {
    name: "author",
    label: "Author",
    help_text: "",
};

pub const GROUP_TITLE: FieldMeta = FieldMeta {
    name: "title",
    label: "Group title",
    help_text: "",
};

pub const GROUP_SLUG: FieldMeta = FieldMeta {
    name: "slug",
    label: "Group slug",
    help_text: "",
};

pub const GROUP_DESCRIPTION: FieldMeta = FieldMeta {
    name: "description",
    label: "Group description",
    help_text: "",
};

pub const COMMENT_TEXT: FieldMeta = FieldMeta {
    name: "text",
    label: "Comment",
    help_text: "Write your comment",
};

/// Fields rendered by the post form, in display order.
pub const POST_FORM_FIELDS: [FieldMeta; 3] = [POST_TEXT, POST_GROUP, POST_IMAGE];
